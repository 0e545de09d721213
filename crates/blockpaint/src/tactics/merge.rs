//! Merge family.
//!
//! All three scan adjacent pairs in id order and merge the first that
//! qualifies, until none does.

use crate::block::BlockId;
use crate::canvas::{Canvas, MoveError};
use crate::image::TargetImage;
use crate::moves::Move;
use crate::state::ProgramState;

use super::{paint, Tactic, TacticStorage};

fn first_pair<F>(canvas: &Canvas, mut accept: F) -> Option<(BlockId, BlockId)>
where
    F: FnMut(&BlockId, &BlockId) -> bool,
{
    canvas
        .mergeable_pairs()
        .into_iter()
        .find(|(a, b)| accept(a, b))
}

/// Merge, then paint the union with its target average.
fn merge_and_color(
    state: ProgramState,
    a: BlockId,
    b: BlockId,
) -> Result<ProgramState, MoveError> {
    let state = state.apply(Move::Merge { a, b })?;
    let Some(id) = state.canvas().last_merge_id() else {
        return Ok(state);
    };
    let Some(shape) = state.canvas().get(&id).map(|block| block.shape()) else {
        return Ok(state);
    };
    let color = state.target().average(&shape);
    paint(state, &id, color)
}

/// Merges until a single block remains (or nothing is adjacent). No recolor.
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeToOne;

impl Tactic for MergeToOne {
    fn name(&self) -> &'static str {
        "merge-to-one"
    }

    fn apply(
        &self,
        mut state: ProgramState,
        _storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        while state.canvas().len() > 1 {
            let Some((a, b)) = first_pair(state.canvas(), |_, _| true) else {
                break;
            };
            state = state.apply(Move::Merge { a, b })?;
        }
        Ok(state)
    }
}

/// Merges neighbours whose target averages share a color bucket.
#[derive(Clone, Copy, Debug)]
pub struct MergerTactic {
    pub bucket_size: u8,
}

impl Default for MergerTactic {
    fn default() -> Self {
        Self { bucket_size: 16 }
    }
}

impl MergerTactic {
    fn same_bucket(&self, target: &TargetImage, canvas: &Canvas, a: &BlockId, b: &BlockId) -> bool {
        match (canvas.get(a), canvas.get(b)) {
            (Some(x), Some(y)) => {
                target.average(&x.shape()).bucket(self.bucket_size)
                    == target.average(&y.shape()).bucket(self.bucket_size)
            }
            _ => false,
        }
    }
}

impl Tactic for MergerTactic {
    fn name(&self) -> &'static str {
        "merger"
    }

    fn apply(
        &self,
        mut state: ProgramState,
        _storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        loop {
            let pair = first_pair(state.canvas(), |a, b| {
                self.same_bucket(state.target(), state.canvas(), a, b)
            });
            let Some((a, b)) = pair else {
                return Ok(state);
            };
            state = merge_and_color(state, a, b)?;
        }
    }
}

/// Merges neighbours while the union stays within `limit` pixels.
#[derive(Clone, Copy, Debug)]
pub struct MergeUntilLimit {
    pub limit: u64,
}

impl Tactic for MergeUntilLimit {
    fn name(&self) -> &'static str {
        "merge-until-limit"
    }

    fn apply(
        &self,
        mut state: ProgramState,
        _storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        loop {
            let canvas = state.canvas();
            let pair = first_pair(canvas, |a, b| match (canvas.get(a), canvas.get(b)) {
                (Some(x), Some(y)) => x.size() + y.size() <= self.limit,
                _ => false,
            });
            let Some((a, b)) = pair else {
                return Ok(state);
            };
            state = merge_and_color(state, a, b)?;
        }
    }
}
