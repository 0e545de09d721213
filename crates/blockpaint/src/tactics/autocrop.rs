//! Border autocropping.
//!
//! Model
//! - The average colors of the four border strips are the candidate border
//!   colors. For each, the block shrinks from all four sides while a whole
//!   row or column matches it (`min_match` of its pixels within `tolerance`).
//!   The candidate that removes the most area wins.
//! - A shrink pays off when it removes more than
//!   `min(block_fraction × block area, canvas_fraction × canvas area)`. The
//!   block is then painted with the border color, the inner rectangle carved
//!   out with at most two cuts, and the inner block processed again with the
//!   initial thresholds.
//! - Otherwise thresholds relax step by step. Once relaxation is exhausted the
//!   block is recorded in `left_blocks`.
//! - A block that shrinks to nothing is uniform: it is painted and done.

use crate::block::BlockId;
use crate::canvas::MoveError;
use crate::color::Color;
use crate::geom::{Orientation, Point, Shape};
use crate::image::TargetImage;
use crate::moves::Move;
use crate::state::ProgramState;

use super::{paint, BlockTactic, TacticStorage};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutocropCfg {
    pub strip: i32,
    pub max_strip: i32,
    pub tolerance: u8,
    pub tolerance_step: u8,
    pub max_tolerance: u8,
    pub min_match: f64,
    pub match_step: f64,
    pub min_match_floor: f64,
    pub block_fraction: f64,
    pub canvas_fraction: f64,
}

impl Default for AutocropCfg {
    fn default() -> Self {
        Self {
            strip: 1,
            max_strip: 3,
            tolerance: 8,
            tolerance_step: 8,
            max_tolerance: 32,
            min_match: 0.95,
            match_step: 0.05,
            min_match_floor: 0.8,
            block_fraction: 0.15,
            canvas_fraction: 0.07,
        }
    }
}

/// Current (possibly relaxed) thresholds.
#[derive(Clone, Copy, Debug)]
struct Thresholds {
    strip: i32,
    tolerance: u8,
    min_match: f64,
}

impl Thresholds {
    fn initial(cfg: &AutocropCfg) -> Self {
        Self {
            strip: cfg.strip.max(1),
            tolerance: cfg.tolerance,
            min_match: cfg.min_match,
        }
    }

    /// Loosen every threshold that still can move; `false` once none can.
    fn relax(&mut self, cfg: &AutocropCfg) -> bool {
        let mut moved = false;
        if self.tolerance < cfg.max_tolerance {
            self.tolerance = self
                .tolerance
                .saturating_add(cfg.tolerance_step.max(1))
                .min(cfg.max_tolerance);
            moved = true;
        }
        if self.min_match > cfg.min_match_floor + 1e-9 {
            self.min_match = (self.min_match - cfg.match_step).max(cfg.min_match_floor);
            moved = true;
        }
        if self.strip < cfg.max_strip {
            self.strip += 1;
            moved = true;
        }
        moved
    }
}

/// Outcome of shrinking one block against one border color.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Shrink {
    color: Color,
    /// `None` when every row matched.
    inner: Option<Shape>,
    removed: u64,
}

fn line_matches(target: &TargetImage, line: Shape, color: Color, t: &Thresholds) -> bool {
    target.match_fraction(&line, color, t.tolerance) >= t.min_match
}

fn shrink_towards(target: &TargetImage, shape: &Shape, color: Color, t: &Thresholds) -> Shrink {
    let (mut l, mut b, mut r, mut top) = (shape.left(), shape.bottom(), shape.right(), shape.top());
    loop {
        let mut moved = false;
        if b < top && line_matches(target, Shape::new(l, b, r, b + 1), color, t) {
            b += 1;
            moved = true;
        }
        if b < top && line_matches(target, Shape::new(l, top - 1, r, top), color, t) {
            top -= 1;
            moved = true;
        }
        if b < top && l < r && line_matches(target, Shape::new(l, b, l + 1, top), color, t) {
            l += 1;
            moved = true;
        }
        if b < top && l < r && line_matches(target, Shape::new(r - 1, b, r, top), color, t) {
            r -= 1;
            moved = true;
        }
        if !moved || b >= top || l >= r {
            break;
        }
    }
    let inner = Shape::try_new(Point::new(l, b), Point::new(r, top));
    Shrink {
        color,
        inner,
        removed: shape.size() - inner.map_or(0, |s| s.size()),
    }
}

/// Average colors of the bottom, top, left and right strips.
fn border_colors(target: &TargetImage, shape: &Shape, strip: i32) -> Vec<Color> {
    let sw = strip.min(shape.width());
    let sh = strip.min(shape.height());
    let strips = [
        Shape::new(shape.left(), shape.bottom(), shape.right(), shape.bottom() + sh),
        Shape::new(shape.left(), shape.top() - sh, shape.right(), shape.top()),
        Shape::new(shape.left(), shape.bottom(), shape.left() + sw, shape.top()),
        Shape::new(shape.right() - sw, shape.bottom(), shape.right(), shape.top()),
    ];
    let mut colors: Vec<Color> = Vec::with_capacity(4);
    for s in &strips {
        let c = target.average(s);
        if !colors.contains(&c) {
            colors.push(c);
        }
    }
    colors
}

fn best_shrink(target: &TargetImage, shape: &Shape, t: &Thresholds) -> Option<Shrink> {
    let mut best: Option<Shrink> = None;
    for color in border_colors(target, shape, t.strip) {
        let s = shrink_towards(target, shape, color, t);
        if best.map_or(true, |b| s.removed > b.removed) {
            best = Some(s);
        }
    }
    best
}

/// Carve `inner` out of `outer` (block `id`); returns the inner block's id.
fn carve(
    mut state: ProgramState,
    id: &BlockId,
    outer: Shape,
    inner: Shape,
) -> Result<(ProgramState, BlockId), MoveError> {
    let mut cur = id.clone();
    // lower-left corner
    let cut_left = inner.left() > outer.left();
    let cut_bottom = inner.bottom() > outer.bottom();
    if cut_left && cut_bottom {
        state = state.apply(Move::PointCut {
            block: cur.clone(),
            point: inner.lower_left(),
        })?;
        cur = cur.child(2);
    } else if cut_left {
        state = state.apply(line_cut(&cur, Orientation::X, inner.left()))?;
        cur = cur.child(1);
    } else if cut_bottom {
        state = state.apply(line_cut(&cur, Orientation::Y, inner.bottom()))?;
        cur = cur.child(1);
    }
    // upper-right corner
    let cut_right = inner.right() < outer.right();
    let cut_top = inner.top() < outer.top();
    if cut_right && cut_top {
        state = state.apply(Move::PointCut {
            block: cur.clone(),
            point: inner.upper_right(),
        })?;
        cur = cur.child(0);
    } else if cut_right {
        state = state.apply(line_cut(&cur, Orientation::X, inner.right()))?;
        cur = cur.child(0);
    } else if cut_top {
        state = state.apply(line_cut(&cur, Orientation::Y, inner.top()))?;
        cur = cur.child(0);
    }
    Ok((state, cur))
}

fn line_cut(block: &BlockId, orientation: Orientation, offset: i32) -> Move {
    Move::LineCut {
        block: block.clone(),
        orientation,
        offset,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Autocrop {
    pub cfg: AutocropCfg,
}

impl Autocrop {
    pub fn new(cfg: AutocropCfg) -> Self {
        Self { cfg }
    }

    fn threshold(&self, block: &Shape, canvas_area: u64) -> f64 {
        (self.cfg.block_fraction * block.size() as f64)
            .min(self.cfg.canvas_fraction * canvas_area as f64)
    }
}

impl BlockTactic for Autocrop {
    fn name(&self) -> &'static str {
        "autocrop"
    }

    fn apply_block(
        &self,
        mut state: ProgramState,
        block: &BlockId,
        storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        let mut id = block.clone();
        let mut t = Thresholds::initial(&self.cfg);
        loop {
            let Some(shape) = state.canvas().get(&id).map(|b| b.shape()) else {
                return Ok(state);
            };
            let threshold = self.threshold(&shape, state.canvas().area());
            match best_shrink(state.target(), &shape, &t) {
                Some(Shrink { color, inner: None, .. }) => return paint(state, &id, color),
                Some(Shrink {
                    color,
                    inner: Some(inner),
                    removed,
                }) if removed as f64 > threshold => {
                    state = paint(state, &id, color)?;
                    let (next, inner_id) = carve(state, &id, shape, inner)?;
                    state = next;
                    id = inner_id;
                    t = Thresholds::initial(&self.cfg);
                }
                _ => {
                    if !t.relax(&self.cfg) {
                        storage.left_blocks.insert(id);
                        return Ok(state);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tactics::{EachBlock, Tactic};

    fn framed(w: i32, h: i32, inner: Shape, frame: Color, fill: Color) -> TargetImage {
        let pixels = (0..h)
            .flat_map(|y| {
                (0..w).map(move |x| {
                    if inner.contains(Point::new(x, y)) {
                        fill
                    } else {
                        frame
                    }
                })
            })
            .collect();
        TargetImage::from_pixels(w as u32, h as u32, pixels).unwrap()
    }

    #[test]
    fn shrink_finds_the_inner_rectangle() {
        let inner = Shape::new(2, 3, 7, 8);
        let target = framed(10, 10, inner, Color::BLACK, Color::WHITE);
        let t = Thresholds::initial(&AutocropCfg::default());
        let best = best_shrink(&target, &target.shape(), &t).unwrap();
        assert_eq!(best.color, Color::BLACK);
        assert_eq!(best.inner, Some(inner));
        assert_eq!(best.removed, 100 - 25);
    }

    #[test]
    fn carves_a_framed_block_with_two_point_cuts() {
        let inner = Shape::new(2, 3, 7, 8);
        let red = Color::new(200, 0, 0, 255);
        let target = Arc::new(framed(10, 10, inner, Color::BLACK, red));
        let mut storage = TacticStorage::default();
        let out = EachBlock(Autocrop::default())
            .apply(ProgramState::new(target), &mut storage)
            .unwrap();
        assert_eq!(out.moves().iter().filter(|m| m.is_cut()).count(), 2);
        assert_eq!(out.similarity(), 0);
        let inner_id: BlockId = "0.2.0".parse().unwrap();
        assert_eq!(out.canvas().get(&inner_id).unwrap().shape(), inner);
        assert_eq!(out.canvas().get(&inner_id).unwrap().color(), Some(red));
        assert!(storage.left_blocks.is_empty());
    }

    #[test]
    fn edge_touching_inner_uses_line_cuts() {
        // inner touches the bottom and right edges
        let inner = Shape::new(4, 0, 10, 6);
        let target = Arc::new(framed(10, 10, inner, Color::WHITE, Color::BLACK));
        let out = Autocrop::default()
            .apply_block(
                ProgramState::new(target),
                &"0".parse().unwrap(),
                &mut TacticStorage::default(),
            )
            .unwrap();
        let moves = out.moves();
        assert!(moves.iter().all(|m| !matches!(m, Move::PointCut { .. })));
        assert_eq!(moves.iter().filter(|m| m.is_cut()).count(), 2);
        assert_eq!(out.similarity(), 0);
    }

    #[test]
    fn noisy_block_is_left_for_later() {
        let pixels = (0..64u32)
            .map(|i| {
                Color::new(
                    (i * 97 % 256) as u8,
                    (i * 31 % 256) as u8,
                    (i * 53 % 256) as u8,
                    255,
                )
            })
            .collect();
        let target = Arc::new(TargetImage::from_pixels(8, 8, pixels).unwrap());
        let mut storage = TacticStorage::default();
        let root: BlockId = "0".parse().unwrap();
        let out = Autocrop::default()
            .apply_block(ProgramState::new(target), &root, &mut storage)
            .unwrap();
        assert!(out.is_empty());
        assert!(storage.left_blocks.contains(&root));
    }

    #[test]
    fn relaxation_terminates() {
        let cfg = AutocropCfg::default();
        let mut t = Thresholds::initial(&cfg);
        let mut steps = 0;
        while t.relax(&cfg) {
            steps += 1;
            assert!(steps < 100);
        }
        assert_eq!(t.tolerance, cfg.max_tolerance);
        assert_eq!(t.strip, cfg.max_strip);
    }
}
