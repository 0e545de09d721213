//! Fixed tactic pipelines.
//!
//! A pipeline threads one `ProgramState` through its stages in order, sharing
//! a fresh `TacticStorage`. There is no backtracking between stages.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::canvas::{Canvas, MoveError};
use crate::color::{Color, ColorMethod};
use crate::image::TargetImage;
use crate::scoring::ScoringCfg;
use crate::state::ProgramState;
use crate::tactics::{
    Autocrop, AutocropCfg, BackgroundTactic, ColorTactic, CutScope, CutStrategy, Cutter,
    CutterCfg, EachBlock, MergeToOne, MergeUntilLimit, MergerTactic, RectCropCfg, RectangleCrop,
    SimilaritySwapper, SnapCfg, Tactic, TacticStorage,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineKind {
    /// merge-to-one, background, autocrop, cut left blocks, merge, color, swap
    AutocropCut,
    /// merge-to-one, background, rectangle crop, cut left blocks, color
    RectCrop,
    /// cut everything, color, merge under a size limit, swap
    GridCut,
    /// exhaustive cuts, merge, color
    Exhaustive,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 4] = [
        PipelineKind::AutocropCut,
        PipelineKind::RectCrop,
        PipelineKind::GridCut,
        PipelineKind::Exhaustive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineKind::AutocropCut => "autocrop-cut",
            PipelineKind::RectCrop => "rect-crop",
            PipelineKind::GridCut => "grid-cut",
            PipelineKind::Exhaustive => "exhaustive",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown pipeline {s:?}, expected one of {}", names.join(", "))
            })
    }
}

/// Knobs shared by all pipelines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverParams {
    pub scoring: ScoringCfg,
    pub autocrop: AutocropCfg,
    pub rect_crop: RectCropCfg,
    /// Cutter stops at blocks of at most this many pixels.
    pub cut_limit: u64,
    pub cut_tolerance: u8,
    /// Snap grid cuts to image edges instead of midpoints.
    pub snap: bool,
    pub snap_cfg: SnapCfg,
    pub bucket_size: u8,
    pub merge_limit: u64,
    pub color_method: ColorMethod,
    pub only_if_improves: bool,
    /// Tie-breaking seed for randomised tactics.
    pub seed: u64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            scoring: ScoringCfg::default(),
            autocrop: AutocropCfg::default(),
            rect_crop: RectCropCfg::default(),
            cut_limit: 400,
            cut_tolerance: 8,
            snap: false,
            snap_cfg: SnapCfg::default(),
            bucket_size: 16,
            merge_limit: 1600,
            color_method: ColorMethod::Average,
            only_if_improves: false,
            seed: 0,
        }
    }
}

impl SolverParams {
    fn cutter(&self, strategy: CutStrategy, scope: CutScope) -> Cutter {
        Cutter::new(CutterCfg {
            size_limit: self.cut_limit,
            tolerance: self.cut_tolerance,
            strategy,
            scope,
            snap: self.snap_cfg,
        })
    }

    fn color(&self) -> ColorTactic {
        ColorTactic {
            method: self.color_method,
            only_if_improves: self.only_if_improves,
        }
    }
}

/// Ordered tactic stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Tactic>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Tactic>>) -> Self {
        Self { stages }
    }

    pub fn build(kind: PipelineKind, params: &SolverParams) -> Self {
        let merger = MergerTactic {
            bucket_size: params.bucket_size,
        };
        let stages: Vec<Box<dyn Tactic>> = match kind {
            PipelineKind::AutocropCut => vec![
                Box::new(MergeToOne),
                Box::new(BackgroundTactic),
                Box::new(EachBlock(Autocrop::new(params.autocrop))),
                Box::new(params.cutter(CutStrategy::Midpoint, CutScope::LeftBlocks)),
                Box::new(merger),
                Box::new(params.color()),
                Box::new(SimilaritySwapper),
            ],
            PipelineKind::RectCrop => vec![
                Box::new(MergeToOne),
                Box::new(BackgroundTactic),
                Box::new(EachBlock(RectangleCrop::new(params.rect_crop))),
                Box::new(params.cutter(CutStrategy::Midpoint, CutScope::LeftBlocks)),
                Box::new(params.color()),
            ],
            PipelineKind::GridCut => {
                let strategy = if params.snap {
                    CutStrategy::Snap
                } else {
                    CutStrategy::Midpoint
                };
                vec![
                    Box::new(params.cutter(strategy, CutScope::All)),
                    Box::new(params.color()),
                    Box::new(MergeUntilLimit {
                        limit: params.merge_limit,
                    }),
                    Box::new(SimilaritySwapper),
                ]
            }
            PipelineKind::Exhaustive => vec![
                Box::new(params.cutter(
                    CutStrategy::Exhaustive { seed: params.seed },
                    CutScope::All,
                )),
                Box::new(merger),
                Box::new(params.color()),
            ],
        };
        Self::new(stages)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, mut state: ProgramState) -> Result<ProgramState, MoveError> {
        let mut storage = TacticStorage::default();
        for stage in &self.stages {
            state = stage.apply(state, &mut storage)?;
            debug!(
                stage = stage.name(),
                moves = state.len(),
                blocks = state.canvas().len(),
                score = state.score().total(),
                "stage done"
            );
        }
        Ok(state)
    }
}

/// Run one pipeline on `target`, from a white canvas unless `start` is given.
pub fn solve(
    kind: PipelineKind,
    params: &SolverParams,
    target: Arc<TargetImage>,
    start: Option<Canvas>,
) -> Result<ProgramState, MoveError> {
    let canvas =
        start.unwrap_or_else(|| Canvas::new(target.width(), target.height(), Color::WHITE));
    let state = ProgramState::with_canvas(target, canvas, params.scoring)?;
    let pipeline = Pipeline::build(kind, params);
    debug!(pipeline = %kind, stages = ?pipeline.stage_names(), "solving");
    pipeline.run(state)
}
