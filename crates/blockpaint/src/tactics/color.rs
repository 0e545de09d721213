//! Block coloring and the background color.

use crate::block::BlockId;
use crate::canvas::MoveError;
use crate::color::ColorMethod;
use crate::moves::Move;
use crate::scoring::rect_error;
use crate::state::ProgramState;

use super::{paint, prefer_background, BlockTactic, Tactic, TacticStorage};

/// Colors blocks with a representative color of their target pixels. A recorded
/// background wins whenever it fits the block at least as well.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorTactic {
    pub method: ColorMethod,
    /// Skip colors whose similarity gain does not cover the instruction price.
    pub only_if_improves: bool,
}

impl ColorTactic {
    pub fn new(method: ColorMethod) -> Self {
        Self {
            method,
            only_if_improves: false,
        }
    }
}

impl BlockTactic for ColorTactic {
    fn name(&self) -> &'static str {
        "color"
    }

    fn apply_block(
        &self,
        state: ProgramState,
        block: &BlockId,
        storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        let Some(current) = state.canvas().get(block) else {
            return Ok(state);
        };
        let shape = current.shape();
        let color = state.target().representative(&shape, self.method);
        let color = prefer_background(&state, storage, &shape, color);
        if current.color() == Some(color) {
            return Ok(state);
        }
        if self.only_if_improves {
            let mv = Move::Color {
                block: block.clone(),
                color,
            };
            let price = state.canvas().cost(&mv)?;
            let before = state.block_error(block).unwrap_or(0);
            let after = rect_error(state.target(), &shape, color);
            let gain = -state.cfg().penalty_delta(before, after);
            if gain <= price as f64 {
                return Ok(state);
            }
        }
        paint(state, block, color)
    }
}

impl Tactic for ColorTactic {
    fn name(&self) -> &'static str {
        "color"
    }

    fn apply(
        &self,
        mut state: ProgramState,
        storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        for id in state.canvas().ids() {
            state = self.apply_block(state, &id, storage)?;
        }
        Ok(state)
    }
}

/// Records the most frequent target color; paints a single-block canvas with it.
#[derive(Clone, Copy, Debug, Default)]
pub struct BackgroundTactic;

impl Tactic for BackgroundTactic {
    fn name(&self) -> &'static str {
        "background"
    }

    fn apply(
        &self,
        state: ProgramState,
        storage: &mut TacticStorage,
    ) -> Result<ProgramState, MoveError> {
        let background = state.target().dominant_color();
        storage.background = Some(background);
        if state.canvas().len() != 1 {
            return Ok(state);
        }
        let Some(root) = state.canvas().ids().into_iter().next() else {
            return Ok(state);
        };
        paint(state, &root, background)
    }
}
