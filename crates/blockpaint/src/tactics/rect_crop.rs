//! Rectangle cropping from block corners.
//!
//! Model
//! - From each block corner a rectangle grows out of a single pixel, extending
//!   alternately along x and y while the newly added strip has at least
//!   `match_fraction` of its pixels within `tolerance` of the growth anchor.
//! - A candidate qualifies when its area is at least `min_size`, smaller than
//!   the block, and the cut carving it leaves no fragment smaller than a third
//!   of `min_size`.
//! - The smallest qualifying candidate is carved with one cut and painted with
//!   its average; the other children are processed in turn. Blocks without a
//!   candidate are recorded in `left_blocks`.
//! - With `seed` set, the corner order is shuffled per block.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::block::BlockId;
use crate::canvas::MoveError;
use crate::color::Color;
use crate::geom::{Orientation, Point, Shape};
use crate::image::TargetImage;
use crate::moves::Move;
use crate::state::ProgramState;

use super::{paint, prefer_background, BlockTactic, TacticStorage};

/// Color new strips are compared against while growing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrowthAnchor {
    /// Running average of the rectangle grown so far.
    #[default]
    Average,
    /// Color of the corner pixel.
    Seed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectCropCfg {
    pub tolerance: u8,
    pub match_fraction: f64,
    pub min_size: u64,
    pub anchor: GrowthAnchor,
    pub seed: Option<u64>,
}

impl Default for RectCropCfg {
    fn default() -> Self {
        Self {
            tolerance: 24,
            match_fraction: 0.8,
            min_size: 64,
            anchor: GrowthAnchor::Average,
            seed: None,
        }
    }
}

// Corner indices follow point-cut child order.
const LL: usize = 0;
const LR: usize = 1;
const UR: usize = 2;
const UL: usize = 3;

fn grows_right(corner: usize) -> bool {
    corner == LL || corner == UL
}

fn grows_up(corner: usize) -> bool {
    corner == LL || corner == LR
}

/// `rightward` for corners growing to the right, else `leftward`.
fn by_x<T>(corner: usize, rightward: T, leftward: T) -> T {
    if grows_right(corner) {
        rightward
    } else {
        leftward
    }
}

/// `upward` for corners growing up, else `downward`.
fn by_y<T>(corner: usize, upward: T, downward: T) -> T {
    if grows_up(corner) {
        upward
    } else {
        downward
    }
}

/// Rectangle grown from `corner` of `block`.
fn grow(target: &TargetImage, block: &Shape, corner: usize, cfg: &RectCropCfg) -> Shape {
    let seed_x = by_x(corner, block.left(), block.right() - 1);
    let seed_y = by_y(corner, block.bottom(), block.top() - 1);
    let seed_color = target.pixel(seed_x, seed_y);
    let mut rect = Shape::new(seed_x, seed_y, seed_x + 1, seed_y + 1);

    let accept = |rect: &Shape, strip: Shape| -> bool {
        let anchor: Color = match cfg.anchor {
            GrowthAnchor::Average => target.average(rect),
            GrowthAnchor::Seed => seed_color,
        };
        target.match_fraction(&strip, anchor, cfg.tolerance) >= cfg.match_fraction
    };

    loop {
        let mut grew = false;
        // x
        let strip = if grows_right(corner) {
            (rect.right() < block.right())
                .then(|| Shape::new(rect.right(), rect.bottom(), rect.right() + 1, rect.top()))
        } else {
            (rect.left() > block.left())
                .then(|| Shape::new(rect.left() - 1, rect.bottom(), rect.left(), rect.top()))
        };
        if let Some(strip) = strip {
            if accept(&rect, strip) {
                rect = bounding(&rect, &strip);
                grew = true;
            }
        }
        // y
        let strip = if grows_up(corner) {
            (rect.top() < block.top())
                .then(|| Shape::new(rect.left(), rect.top(), rect.right(), rect.top() + 1))
        } else {
            (rect.bottom() > block.bottom())
                .then(|| Shape::new(rect.left(), rect.bottom() - 1, rect.right(), rect.bottom()))
        };
        if let Some(strip) = strip {
            if accept(&rect, strip) {
                rect = bounding(&rect, &strip);
                grew = true;
            }
        }
        if !grew {
            return rect;
        }
    }
}

fn bounding(a: &Shape, b: &Shape) -> Shape {
    Shape::new(
        a.left().min(b.left()),
        a.bottom().min(b.bottom()),
        a.right().max(b.right()),
        a.top().max(b.top()),
    )
}

/// A carve-ready crop.
#[derive(Clone, Debug, PartialEq)]
struct Candidate {
    rect: Shape,
    mv: Move,
    crop: u32,
    rest: Vec<u32>,
}

/// The single cut that separates `rect` (anchored at `corner`) from `block`.
fn candidate(
    id: &BlockId,
    block: &Shape,
    corner: usize,
    rect: Shape,
    min_size: u64,
) -> Option<Candidate> {
    if rect.size() < min_size || rect.size() >= block.size() {
        return None;
    }
    let (mv, crop, fragments): (Move, u32, Vec<Shape>) = if rect.width() == block.width() {
        let offset = by_y(corner, rect.top(), rect.bottom());
        let (lo, hi) = block.split_line(Orientation::Y, offset)?;
        let (crop, frag) = by_y(corner, (0, hi), (1, lo));
        (
            Move::LineCut {
                block: id.clone(),
                orientation: Orientation::Y,
                offset,
            },
            crop,
            vec![frag],
        )
    } else if rect.height() == block.height() {
        let offset = by_x(corner, rect.right(), rect.left());
        let (lo, hi) = block.split_line(Orientation::X, offset)?;
        let (crop, frag) = by_x(corner, (0, hi), (1, lo));
        (
            Move::LineCut {
                block: id.clone(),
                orientation: Orientation::X,
                offset,
            },
            crop,
            vec![frag],
        )
    } else {
        let point = Point::new(
            by_x(corner, rect.right(), rect.left()),
            by_y(corner, rect.top(), rect.bottom()),
        );
        let quads = block.split_point(point)?;
        let fragments = quads
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != corner)
            .map(|(_, s)| *s)
            .collect();
        (
            Move::PointCut {
                block: id.clone(),
                point,
            },
            corner as u32,
            fragments,
        )
    };
    if fragments.iter().any(|f| f.size() * 3 < min_size) {
        return None;
    }
    let children = if matches!(mv, Move::PointCut { .. }) { 4 } else { 2 };
    Some(Candidate {
        rect,
        mv,
        crop,
        rest: (0..children).filter(|&c| c != crop).collect(),
    })
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RectangleCrop {
    pub cfg: RectCropCfg,
}

impl RectangleCrop {
    pub fn new(cfg: RectCropCfg) -> Self {
        Self { cfg }
    }

    fn best_candidate(
        &self,
        target: &TargetImage,
        id: &BlockId,
        block: &Shape,
        rng: Option<&mut StdRng>,
    ) -> Option<Candidate> {
        let mut corners = [LL, LR, UR, UL];
        if let Some(rng) = rng {
            corners.shuffle(rng);
        }
        let mut best: Option<Candidate> = None;
        for corner in corners {
            let rect = grow(target, block, corner, &self.cfg);
            let Some(c) = candidate(id, block, corner, rect, self.cfg.min_size) else {
                continue;
            };
            if best.as_ref().map_or(true, |b| c.rect.size() < b.rect.size()) {
                best = Some(c);
            }
        }
        best
    }
}

impl BlockTactic for RectangleCrop {
    fn name(&self) -> &'static str {
        "rect-crop"
    }

    fn apply_block(
        &self,
        mut state: ProgramState,
        block: &BlockId,
        storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        let mut rng = self.cfg.seed.map(StdRng::seed_from_u64);
        let target = std::sync::Arc::clone(state.target());
        let mut queue = VecDeque::from([block.clone()]);
        while let Some(id) = queue.pop_front() {
            let Some(shape) = state.canvas().get(&id).map(|b| b.shape()) else {
                continue;
            };
            let Some(c) = self.best_candidate(&target, &id, &shape, rng.as_mut()) else {
                storage.left_blocks.insert(id);
                continue;
            };
            state = state.apply(c.mv)?;
            let fill = prefer_background(&state, storage, &c.rect, target.average(&c.rect));
            state = paint(state, &id.child(c.crop), fill)?;
            queue.extend(c.rest.iter().map(|&i| id.child(i)));
        }
        Ok(state)
    }
}
