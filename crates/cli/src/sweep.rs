//! Parameter sweeps over a rayon pool.
//!
//! Each grid point runs one pipeline from a blank canvas. The wall-clock
//! deadline and the run cap are checked before a run starts; runs already in
//! flight finish. Only the best state is kept, the rest is summarised in
//! `RunRecord`s.

use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use blockpaint::{solve, PipelineKind, ProgramState, TargetImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::params::ParamsDoc;

/// Cartesian grid; `base` supplies every field the grid does not vary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepGrid {
    pub pipelines: Vec<String>,
    pub cut_limits: Vec<u64>,
    pub merge_limits: Vec<u64>,
    pub bucket_sizes: Vec<u8>,
    pub color_methods: Vec<String>,
    pub seeds: Vec<u64>,
    pub base: ParamsDoc,
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self {
            pipelines: PipelineKind::ALL.iter().map(|k| k.to_string()).collect(),
            cut_limits: vec![100, 400, 1600],
            merge_limits: vec![1600],
            bucket_sizes: vec![8, 16, 32],
            color_methods: vec!["average".into()],
            seeds: vec![0],
            base: ParamsDoc::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSpec {
    pub pipeline: PipelineKind,
    pub params: ParamsDoc,
}

impl SweepGrid {
    pub fn expand(&self) -> Result<Vec<RunSpec>> {
        let kinds = self
            .pipelines
            .iter()
            .map(|s| s.parse::<PipelineKind>().map_err(|e| anyhow!(e)))
            .collect::<Result<Vec<_>>>()?;
        let mut specs = Vec::new();
        for &pipeline in &kinds {
            for &cut_limit in &self.cut_limits {
                for &merge_limit in &self.merge_limits {
                    for &bucket_size in &self.bucket_sizes {
                        for method in &self.color_methods {
                            for &seed in &self.seeds {
                                let params = ParamsDoc {
                                    cut_limit,
                                    merge_limit,
                                    bucket_size,
                                    color_method: method.clone(),
                                    seed,
                                    ..self.base.clone()
                                };
                                params.to_solver()?;
                                specs.push(RunSpec { pipeline, params });
                            }
                        }
                    }
                }
            }
        }
        Ok(specs)
    }
}

/// One finished run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub problem_id: Option<i64>,
    pub pipeline: String,
    pub params: ParamsDoc,
    pub total: u64,
    pub cost: u64,
    pub similarity: u64,
    pub moves: usize,
    pub millis: u64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SweepLimits {
    pub deadline: Option<Duration>,
    pub max_runs: Option<usize>,
}

pub struct SweepOutcome {
    pub records: Vec<RunRecord>,
    pub best: Option<(RunSpec, ProgramState)>,
    pub skipped: usize,
}

pub fn run_sweep(
    target: Arc<TargetImage>,
    specs: Vec<RunSpec>,
    limits: SweepLimits,
    problem_id: Option<i64>,
) -> SweepOutcome {
    let started = Instant::now();
    let launched = AtomicUsize::new(0);
    let planned = specs.len();

    let finished: Vec<(RunRecord, RunSpec, ProgramState)> = specs
        .into_par_iter()
        .filter_map(|spec| {
            if limits.deadline.is_some_and(|d| started.elapsed() >= d) {
                return None;
            }
            if let Some(cap) = limits.max_runs {
                if launched.fetch_add(1, Ordering::SeqCst) >= cap {
                    return None;
                }
            }
            let params = match spec.params.to_solver() {
                Ok(p) => p,
                Err(err) => {
                    warn!(pipeline = %spec.pipeline, error = %err, "skipping run");
                    return None;
                }
            };
            let t0 = Instant::now();
            let state = guarded(spec.pipeline, || {
                solve(spec.pipeline, &params, Arc::clone(&target), None)
            })?;
            let score = state.score();
            let record = RunRecord {
                problem_id,
                pipeline: spec.pipeline.to_string(),
                params: spec.params.clone(),
                total: score.total(),
                cost: score.cost,
                similarity: score.similarity,
                moves: state.len(),
                millis: t0.elapsed().as_millis() as u64,
            };
            Some((record, spec, state))
        })
        .collect();

    let skipped = planned - finished.len();
    let mut records = Vec::with_capacity(finished.len());
    let mut best: Option<(RunSpec, ProgramState)> = None;
    for (record, spec, state) in finished {
        let better = best
            .as_ref()
            .map_or(true, |(_, b)| state.score().total() < b.score().total());
        if better {
            best = Some((spec, state));
        }
        records.push(record);
    }
    SweepOutcome {
        records,
        best,
        skipped,
    }
}

/// Runs one pipeline; an error or a panic becomes a logged skip.
fn guarded<T, E: Display>(
    pipeline: PipelineKind,
    run: impl FnOnce() -> Result<T, E>,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!(%pipeline, error = %err, "run failed");
            None
        }
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic".to_string());
            warn!(%pipeline, panic = %msg, "run panicked");
            None
        }
    }
}
