//! Snap points: image coordinates where many edges line up.
//!
//! A vertical line `x` is a snap coordinate when at least `min_fraction` of the
//! pixel pairs `(x - 1, y)`/`(x, y)` differ by more than `tolerance` on some
//! channel. Horizontal lines likewise.

use crate::color::Color;
use crate::image::TargetImage;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapCfg {
    pub tolerance: u8,
    pub min_fraction: f64,
}

impl Default for SnapCfg {
    fn default() -> Self {
        Self {
            tolerance: 24,
            min_fraction: 0.25,
        }
    }
}

/// Sorted snap coordinates per axis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapPoints {
    pub xs: Vec<i32>,
    pub ys: Vec<i32>,
}

impl SnapPoints {
    pub fn compute(target: &TargetImage, cfg: SnapCfg) -> Self {
        let (w, h) = (target.width() as i32, target.height() as i32);
        let differs = |a: Color, b: Color| !a.approx_eq(b, cfg.tolerance);
        let xs = (1..w)
            .filter(|&x| {
                let hits = (0..h)
                    .filter(|&y| differs(target.pixel(x - 1, y), target.pixel(x, y)))
                    .count();
                hits as f64 >= cfg.min_fraction * h as f64
            })
            .collect();
        let ys = (1..h)
            .filter(|&y| {
                let below = target.row(y - 1, 0, w);
                let above = target.row(y, 0, w);
                let hits = below
                    .iter()
                    .zip(above)
                    .filter(|(a, b)| differs(**a, **b))
                    .count();
                hits as f64 >= cfg.min_fraction * w as f64
            })
            .collect();
        Self { xs, ys }
    }

    /// Snap x closest to `target` within `[lo, hi]`.
    pub fn nearest_x(&self, lo: i32, hi: i32, target: i32) -> Option<i32> {
        nearest(&self.xs, lo, hi, target)
    }

    pub fn nearest_y(&self, lo: i32, hi: i32, target: i32) -> Option<i32> {
        nearest(&self.ys, lo, hi, target)
    }
}

// ties go to the lower coordinate
fn nearest(coords: &[i32], lo: i32, hi: i32, target: i32) -> Option<i32> {
    let start = coords.partition_point(|&c| c < lo);
    coords[start..]
        .iter()
        .take_while(|&&c| c <= hi)
        .copied()
        .min_by_key(|&c| (c - target).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_edges_of_a_stripe() {
        let red = Color::new(255, 0, 0, 255);
        let pixels = (0..6)
            .flat_map(|_| {
                (0..8).map(|x| {
                    if (3..5).contains(&x) {
                        red
                    } else {
                        Color::WHITE
                    }
                })
            })
            .collect();
        let target = TargetImage::from_pixels(8, 6, pixels).unwrap();
        let snaps = SnapPoints::compute(&target, SnapCfg::default());
        assert_eq!(snaps.xs, vec![3, 5]);
        assert!(snaps.ys.is_empty());
        assert_eq!(snaps.nearest_x(1, 7, 4), Some(3));
        assert_eq!(snaps.nearest_x(4, 7, 4), Some(5));
        assert_eq!(snaps.nearest_x(6, 7, 6), None);
        assert_eq!(snaps.nearest_y(1, 5, 3), None);
    }
}
