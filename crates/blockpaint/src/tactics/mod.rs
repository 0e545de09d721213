//! Composable construction steps.
//!
//! Purpose
//! - A tactic consumes a `ProgramState` and returns a derived one. Whole-canvas
//!   tactics implement `Tactic`; tactics that act on one block implement
//!   `BlockTactic` and are lifted with `EachBlock`.
//!
//! Conventions
//! - "Nothing to do" returns the state unchanged. A `MoveError` escaping a
//!   tactic means it emitted an instruction it had not validated, i.e. a bug.
//! - Results shared between stages of one run live in `TacticStorage`, created
//!   fresh per run.

use std::collections::BTreeSet;

use crate::block::BlockId;
use crate::canvas::MoveError;
use crate::color::Color;
use crate::geom::Shape;
use crate::moves::Move;
use crate::scoring::rect_error;
use crate::state::ProgramState;

pub mod autocrop;
pub mod color;
pub mod cutter;
pub mod merge;
pub mod rect_crop;
pub mod snap;
pub mod swap;

pub use autocrop::{Autocrop, AutocropCfg};
pub use color::{BackgroundTactic, ColorTactic};
pub use cutter::{CutScope, CutStrategy, Cutter, CutterCfg};
pub use merge::{MergeToOne, MergeUntilLimit, MergerTactic};
pub use rect_crop::{GrowthAnchor, RectCropCfg, RectangleCrop};
pub use snap::{SnapCfg, SnapPoints};
pub use swap::SimilaritySwapper;

/// Whole-canvas step.
pub trait Tactic {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        state: ProgramState,
        storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError>;
}

/// Step acting on a single block.
pub trait BlockTactic {
    fn name(&self) -> &'static str;

    fn apply_block(
        &self,
        state: ProgramState,
        block: &BlockId,
        storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError>;
}

/// Runs a block tactic over the ids present when it starts. Ids that vanish
/// while earlier blocks are processed are skipped.
#[derive(Clone, Debug, Default)]
pub struct EachBlock<T>(pub T);

impl<T: BlockTactic> Tactic for EachBlock<T> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn apply(
        &self,
        mut state: ProgramState,
        storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        for id in state.canvas().ids() {
            if state.canvas().contains(&id) {
                state = self.0.apply_block(state, &id, storage)?;
            }
        }
        Ok(state)
    }
}

/// Per-run results shared between tactics.
#[derive(Clone, Debug, Default)]
pub struct TacticStorage {
    /// Most frequent target color, once `BackgroundTactic` ran.
    pub background: Option<Color>,
    /// Blocks a tactic could not improve structurally.
    pub left_blocks: BTreeSet<BlockId>,
    pub snap_points: Option<SnapPoints>,
}

impl TacticStorage {
    /// Recorded left blocks that still exist on the canvas.
    pub fn live_left_blocks(&self, state: &ProgramState) -> Vec<BlockId> {
        self.left_blocks
            .iter()
            .filter(|id| state.canvas().contains(id))
            .cloned()
            .collect()
    }
}

/// `color`, or the recorded background when that fits `shape` at least as well.
pub(crate) fn prefer_background(
    state: &ProgramState,
    storage: &TacticStorage,
    shape: &Shape,
    color: Color,
) -> Color {
    match storage.background {
        Some(bg)
            if bg != color
                && rect_error(state.target(), shape, bg)
                    <= rect_error(state.target(), shape, color) =>
        {
            bg
        }
        _ => color,
    }
}

/// Color `block` unless it already shows exactly `color`.
pub(crate) fn paint(
    state: ProgramState,
    block: &BlockId,
    color: Color,
) -> Result<ProgramState, MoveError> {
    let current = state
        .canvas()
        .get(block)
        .ok_or_else(|| MoveError::UnknownBlock(block.clone()))?
        .color();
    if current == Some(color) {
        return Ok(state);
    }
    state.apply(Move::Color {
        block: block.clone(),
        color,
    })
}

#[cfg(test)]
mod tests;
