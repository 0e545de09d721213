//! Immutable program state threaded through tactics.
//!
//! Purpose
//! - Bundle target, canvas, move history, accumulated cost and the running
//!   similarity error into one value that tactics consume and return.
//!
//! Why this design
//! - `apply` never mutates `self`: the canvas and the per-block error cache are
//!   copied on write behind `Arc`, the history is a shared cons list. Earlier
//!   snapshots stay valid, so callers can branch from any prefix.
//! - The similarity error is maintained incrementally from the blocks a move
//!   removes and adds; `recomputed_raw_error` rescans for cross-checks.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::block::BlockId;
use crate::canvas::{Canvas, MoveError};
use crate::color::Color;
use crate::image::TargetImage;
use crate::moves::{program_text, Move};
use crate::scoring::{block_error, raw_similarity, Score, ScoringCfg};

#[derive(Debug)]
struct MoveNode {
    mv: Move,
    prev: Option<Arc<MoveNode>>,
}

impl Drop for MoveNode {
    // unlink iteratively; long programs would otherwise recurse once per move
    fn drop(&mut self) {
        let mut next = self.prev.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut inner) => next = inner.prev.take(),
                Err(_) => break,
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ProgramState {
    target: Arc<TargetImage>,
    cfg: ScoringCfg,
    canvas: Arc<Canvas>,
    errors: Arc<BTreeMap<BlockId, u64>>,
    history: Option<Arc<MoveNode>>,
    len: usize,
    cost: u64,
    raw_error: u64,
}

impl ProgramState {
    /// Empty program on a white canvas of the target's size.
    pub fn new(target: Arc<TargetImage>) -> Self {
        let canvas = Canvas::new(target.width(), target.height(), Color::WHITE);
        Self::from_parts(target, canvas, ScoringCfg::default())
    }

    /// Empty program starting from an existing partition of the target's size.
    pub fn with_canvas(
        target: Arc<TargetImage>,
        canvas: Canvas,
        cfg: ScoringCfg,
    ) -> Result<Self, MoveError> {
        let (cw, ch) = (canvas.width(), canvas.height());
        if (cw, ch) != (target.width(), target.height()) {
            return Err(MoveError::SizeMismatch {
                canvas: (cw, ch),
                target: (target.width(), target.height()),
            });
        }
        Ok(Self::from_parts(target, canvas, cfg))
    }

    fn from_parts(target: Arc<TargetImage>, canvas: Canvas, cfg: ScoringCfg) -> Self {
        let errors: BTreeMap<BlockId, u64> = canvas
            .blocks()
            .map(|(id, b)| (id.clone(), block_error(&target, b)))
            .collect();
        let raw_error = errors.values().sum();
        Self {
            target,
            cfg,
            canvas: Arc::new(canvas),
            errors: Arc::new(errors),
            history: None,
            len: 0,
            cost: 0,
            raw_error,
        }
    }

    /// New state with `mv` appended; `self` is left untouched.
    pub fn apply(&self, mv: Move) -> Result<ProgramState, MoveError> {
        let price = self.canvas.cost(&mv)?;
        let mut canvas = (*self.canvas).clone();
        let change = canvas.apply(&mv)?;

        let mut errors = (*self.errors).clone();
        let mut raw = self.raw_error;
        for (id, old) in &change.removed {
            raw -= errors
                .remove(id)
                .unwrap_or_else(|| block_error(&self.target, old));
        }
        for id in &change.added {
            if let Some(block) = canvas.get(id) {
                let e = block_error(&self.target, block);
                raw += e;
                errors.insert(id.clone(), e);
            }
        }
        debug_assert!(canvas.len() == errors.len());

        Ok(Self {
            target: Arc::clone(&self.target),
            cfg: self.cfg,
            canvas: Arc::new(canvas),
            errors: Arc::new(errors),
            history: Some(Arc::new(MoveNode {
                mv,
                prev: self.history.clone(),
            })),
            len: self.len + 1,
            cost: self.cost + price,
            raw_error: raw,
        })
    }

    /// Apply a sequence, stopping at the first invalid move.
    pub fn apply_all<I: IntoIterator<Item = Move>>(
        &self,
        moves: I,
    ) -> Result<ProgramState, MoveError> {
        let mut state = self.clone();
        for mv in moves {
            state = state.apply(mv)?;
        }
        Ok(state)
    }

    #[inline]
    pub fn target(&self) -> &Arc<TargetImage> {
        &self.target
    }
    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
    #[inline]
    pub fn cfg(&self) -> ScoringCfg {
        self.cfg
    }
    /// Accumulated instruction cost.
    #[inline]
    pub fn cost(&self) -> u64 {
        self.cost
    }
    /// Fixed-point similarity error kept incrementally.
    #[inline]
    pub fn raw_error(&self) -> u64 {
        self.raw_error
    }
    #[inline]
    pub fn similarity(&self) -> u64 {
        self.cfg.penalty(self.raw_error)
    }
    #[inline]
    pub fn score(&self) -> Score {
        Score {
            cost: self.cost,
            similarity: self.similarity(),
        }
    }
    /// Number of instructions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cached error of one block.
    #[inline]
    pub fn block_error(&self, id: &BlockId) -> Option<u64> {
        self.errors.get(id).copied()
    }

    /// Instructions in program order.
    pub fn moves(&self) -> Vec<Move> {
        let mut out = Vec::with_capacity(self.len);
        let mut cur = self.history.as_deref();
        while let Some(node) = cur {
            out.push(node.mv.clone());
            cur = node.prev.as_deref();
        }
        out.reverse();
        out
    }

    /// Most recent instruction.
    pub fn last_move(&self) -> Option<&Move> {
        self.history.as_deref().map(|n| &n.mv)
    }

    /// Serialized program text.
    pub fn program_text(&self) -> String {
        program_text(&self.moves())
    }

    /// Full rescan of the canvas error.
    pub fn recomputed_raw_error(&self) -> u64 {
        raw_similarity(&self.target, &self.canvas)
    }
}
