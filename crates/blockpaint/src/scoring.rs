//! Instruction prices and the similarity penalty.
//!
//! Model
//! - Per-pixel error is the Euclidean RGBA distance, stored as fixed point
//!   (`ERROR_SCALE` units per distance unit). Integer sums make the incremental
//!   total kept by `ProgramState` identical to a full rescan regardless of
//!   summation order.
//! - `similarity = round(factor × Σ distance)`; total score = instruction cost
//!   + similarity, lower is better.

use crate::block::Block;
use crate::canvas::Canvas;
use crate::color::Color;
use crate::geom::Shape;
use crate::image::TargetImage;

/// Fixed-point units per unit of color distance.
pub const ERROR_SCALE: f64 = 65536.0;

/// Default weight of the summed pixel distance.
pub const DEFAULT_SIMILARITY_FACTOR: f64 = 0.005;

/// Scoring configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringCfg {
    pub similarity_factor: f64,
}

impl Default for ScoringCfg {
    fn default() -> Self {
        Self {
            similarity_factor: DEFAULT_SIMILARITY_FACTOR,
        }
    }
}

impl ScoringCfg {
    /// Penalty for a raw (fixed-point) error sum.
    #[inline]
    pub fn penalty(&self, raw_error: u64) -> u64 {
        (self.similarity_factor * raw_error as f64 / ERROR_SCALE).round() as u64
    }

    /// Penalty difference of two raw sums, unrounded (for comparisons).
    #[inline]
    pub fn penalty_delta(&self, before: u64, after: u64) -> f64 {
        self.similarity_factor * (after as f64 - before as f64) / ERROR_SCALE
    }
}

/// `round(base × canvas_area / block_area)`.
#[inline]
pub fn instruction_cost(base: u64, canvas_area: u64, block_area: u64) -> u64 {
    (base as f64 * canvas_area as f64 / block_area.max(1) as f64).round() as u64
}

/// Fixed-point error of one pixel pair.
#[inline]
pub fn pixel_error(a: Color, b: Color) -> u64 {
    (a.distance(b) * ERROR_SCALE).round() as u64
}

/// Error of painting `shape` with `color`.
pub fn rect_error(target: &TargetImage, shape: &Shape, color: Color) -> u64 {
    (shape.bottom()..shape.top())
        .map(|y| {
            target
                .row(y, shape.left(), shape.right())
                .iter()
                .map(|&t| pixel_error(t, color))
                .sum::<u64>()
        })
        .sum()
}

/// Error of one block, merged pieces included.
pub fn block_error(target: &TargetImage, block: &Block) -> u64 {
    match block {
        Block::Simple { shape, color } => rect_error(target, shape, *color),
        Block::Merged { parts, .. } => parts
            .iter()
            .map(|(s, c)| rect_error(target, s, *c))
            .sum(),
    }
}

/// Full rescan of the canvas against the target.
pub fn raw_similarity(target: &TargetImage, canvas: &Canvas) -> u64 {
    canvas.blocks().map(|(_, b)| block_error(target, b)).sum()
}

/// Cost and similarity of a program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Score {
    pub cost: u64,
    pub similarity: u64,
}

impl Score {
    #[inline]
    pub fn total(&self) -> u64 {
        self.cost + self.similarity
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (cost {}, similarity {})",
            self.total(),
            self.cost,
            self.similarity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_scales_with_area_ratio() {
        assert_eq!(instruction_cost(5, 16, 16), 5);
        assert_eq!(instruction_cost(7, 400 * 400, 200 * 400), 14);
        assert_eq!(instruction_cost(10, 16, 3), 53);
    }

    #[test]
    fn white_on_black_penalty() {
        let target = TargetImage::uniform(4, 4, Color::WHITE).unwrap();
        let canvas = Canvas::new(4, 4, Color::BLACK);
        let raw = raw_similarity(&target, &canvas);
        // distance white->black over rgb = 255*sqrt(3), alpha equal
        let expected = (16.0 * 255.0 * 3f64.sqrt() * 0.005).round() as u64;
        assert_eq!(ScoringCfg::default().penalty(raw), expected);
        assert_eq!(expected, 35);
        let white = Canvas::new(4, 4, Color::WHITE);
        assert_eq!(raw_similarity(&target, &white), 0);
    }

    #[test]
    fn score_total_and_display() {
        let a = Score {
            cost: 10,
            similarity: 5,
        };
        assert_eq!(a.total(), 15);
        assert_eq!(a.to_string(), "15 (cost 10, similarity 5)");
    }
}
