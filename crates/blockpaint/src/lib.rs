//! Block-canvas program synthesis.
//!
//! A canvas is a partition of rectangular blocks. Programs of cut, color, swap
//! and merge instructions reshape and repaint it; a program's score is its
//! instruction cost plus the remaining pixel difference to a target image.
//! Tactics build programs greedily and compose into fixed solver pipelines.
//!
//! Layout
//! - `geom`, `color`, `image`: value types and the target image.
//! - `block`, `canvas`, `moves`: the partition and instruction semantics.
//! - `scoring`, `state`: prices, similarity and the persistent program state.
//! - `tactics`, `solvers`: construction steps and pipelines.
//!
//! Coordinates have their origin at the bottom-left pixel, `y` grows upward.

pub mod block;
pub mod canvas;
pub mod color;
pub mod geom;
pub mod image;
pub mod moves;
pub mod scoring;
pub mod solvers;
pub mod state;
pub mod tactics;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use canvas::{Canvas, MoveError};
pub use image::{ImageError, TargetImage};
pub use moves::{parse_program, program_text, Move, ParseError};
pub use scoring::{Score, ScoringCfg};
pub use solvers::{solve, Pipeline, PipelineKind, SolverParams};
pub use state::ProgramState;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::block::{Block, BlockId};
    pub use crate::canvas::{Canvas, MoveError};
    pub use crate::color::{Color, ColorMethod};
    pub use crate::geom::{Orientation, Point, Shape};
    pub use crate::image::TargetImage;
    pub use crate::moves::{parse_program, program_text, Move};
    pub use crate::scoring::{Score, ScoringCfg};
    pub use crate::solvers::{solve, PipelineKind, SolverParams};
    pub use crate::state::ProgramState;
    pub use crate::tactics::{BlockTactic, EachBlock, Tactic, TacticStorage};
}
