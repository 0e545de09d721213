//! Breadth-first cutting until blocks are small or uniform.
//!
//! Model
//! - A block is cut while its area exceeds `size_limit` and some pixel strays
//!   more than `tolerance` from the block average. Children are queued; the
//!   final leaves replace `left_blocks`.
//! - Blocks one pixel wide (or tall) get a line cut on the other axis.
//!
//! Cut placement
//! - `Midpoint`: the integer midpoint.
//! - `Snap`: per axis, the snap coordinate nearest the midpoint inside the
//!   middle half of the block; midpoint when none qualifies.
//! - `Exhaustive`: per axis, the offset in the middle half maximising the
//!   squared distance between the average colors of the two halves. Ties go
//!   to the offset closest to the midpoint, then to a seeded shuffle.

use std::collections::{BTreeSet, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::block::BlockId;
use crate::canvas::MoveError;
use crate::geom::{Orientation, Point, Shape};
use crate::image::TargetImage;
use crate::moves::Move;
use crate::state::ProgramState;

use super::snap::{SnapCfg, SnapPoints};
use super::{Tactic, TacticStorage};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CutStrategy {
    #[default]
    Midpoint,
    Snap,
    Exhaustive {
        seed: u64,
    },
}

/// Which blocks seed the queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CutScope {
    #[default]
    All,
    LeftBlocks,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutterCfg {
    pub size_limit: u64,
    pub tolerance: u8,
    pub strategy: CutStrategy,
    pub scope: CutScope,
    /// Used when `Snap` runs before any snap points were computed.
    pub snap: SnapCfg,
}

impl Default for CutterCfg {
    fn default() -> Self {
        Self {
            size_limit: 400,
            tolerance: 8,
            strategy: CutStrategy::Midpoint,
            scope: CutScope::All,
            snap: SnapCfg::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Cutter {
    pub cfg: CutterCfg,
}

impl Cutter {
    pub fn new(cfg: CutterCfg) -> Self {
        Self { cfg }
    }

    fn wants_cut(&self, target: &TargetImage, shape: &Shape) -> bool {
        shape.size() > self.cfg.size_limit
            && shape.size() > 1
            && !target.is_uniform(shape, self.cfg.tolerance)
    }

    fn cut_for(
        &self,
        block: &BlockId,
        shape: &Shape,
        target: &TargetImage,
        snaps: Option<&SnapPoints>,
        rng: &mut StdRng,
    ) -> Move {
        let pick = |axis: Orientation, rng: &mut StdRng| -> i32 {
            let mid = match axis {
                Orientation::X => shape.midpoint().x,
                Orientation::Y => shape.midpoint().y,
            };
            let (lo, hi) = middle_half(shape, axis);
            match self.cfg.strategy {
                CutStrategy::Midpoint => mid,
                CutStrategy::Snap => {
                    let snapped = snaps.and_then(|s| match axis {
                        Orientation::X => s.nearest_x(lo, hi, mid),
                        Orientation::Y => s.nearest_y(lo, hi, mid),
                    });
                    snapped.unwrap_or(mid)
                }
                CutStrategy::Exhaustive { .. } => {
                    best_split(target, shape, axis, lo, hi, mid, rng)
                }
            }
        };
        if shape.width() == 1 {
            Move::LineCut {
                block: block.clone(),
                orientation: Orientation::Y,
                offset: pick(Orientation::Y, rng),
            }
        } else if shape.height() == 1 {
            Move::LineCut {
                block: block.clone(),
                orientation: Orientation::X,
                offset: pick(Orientation::X, rng),
            }
        } else {
            let x = pick(Orientation::X, rng);
            let y = pick(Orientation::Y, rng);
            Move::PointCut {
                block: block.clone(),
                point: Point::new(x, y),
            }
        }
    }
}

/// Inclusive offset range of the middle half, always strictly inside.
fn middle_half(shape: &Shape, axis: Orientation) -> (i32, i32) {
    let (start, end) = shape.span(axis);
    let quarter = ((end - start) / 4).max(1);
    let lo = start + quarter;
    let hi = (end - quarter).max(lo);
    (lo, hi)
}

fn best_split(
    target: &TargetImage,
    shape: &Shape,
    axis: Orientation,
    lo: i32,
    hi: i32,
    mid: i32,
    rng: &mut StdRng,
) -> i32 {
    let mut offsets: Vec<i32> = (lo..=hi).filter(|&o| shape.strictly_inside(axis, o)).collect();
    offsets.shuffle(rng);
    let mut best: Option<(u32, i32, i32)> = None;
    for o in offsets {
        let Some((a, b)) = shape.split_line(axis, o) else {
            continue;
        };
        let contrast = target.average(&a).distance_sq(target.average(&b));
        let dist = (o - mid).abs();
        let better = match best {
            None => true,
            Some((c, d, _)) => contrast > c || (contrast == c && dist < d),
        };
        if better {
            best = Some((contrast, dist, o));
        }
    }
    best.map_or(mid, |(_, _, o)| o)
}

impl Tactic for Cutter {
    fn name(&self) -> &'static str {
        "cutter"
    }

    fn apply(
        &self,
        mut state: ProgramState,
        storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        let start = match self.cfg.scope {
            CutScope::All => state.canvas().ids(),
            CutScope::LeftBlocks => storage.live_left_blocks(&state),
        };
        if self.cfg.strategy == CutStrategy::Snap && storage.snap_points.is_none() {
            storage.snap_points = Some(SnapPoints::compute(state.target(), self.cfg.snap));
        }
        let seed = match self.cfg.strategy {
            CutStrategy::Exhaustive { seed } => seed,
            _ => 0,
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let target = std::sync::Arc::clone(state.target());

        let mut queue: VecDeque<BlockId> = start.into();
        let mut leaves = BTreeSet::new();
        while let Some(id) = queue.pop_front() {
            let Some(block) = state.canvas().get(&id) else {
                continue;
            };
            let shape = block.shape();
            if !self.wants_cut(&target, &shape) {
                leaves.insert(id);
                continue;
            }
            let mv = self.cut_for(&id, &shape, &target, storage.snap_points.as_ref(), &mut rng);
            let children = if matches!(mv, Move::PointCut { .. }) { 4 } else { 2 };
            state = state.apply(mv)?;
            queue.extend((0..children).map(|i| id.child(i)));
        }
        match self.cfg.scope {
            CutScope::All => storage.left_blocks = leaves,
            CutScope::LeftBlocks => {
                storage.left_blocks.retain(|id| state.canvas().contains(id));
                storage.left_blocks.extend(leaves);
            }
        }
        Ok(state)
    }
}
