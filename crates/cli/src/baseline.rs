//! Best-known scores per problem, read from a `problem_id,score` CSV.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Baseline {
    scores: BTreeMap<i64, u64>,
}

impl Baseline {
    pub fn load(path: &Path) -> Result<Self> {
        let df = read_frame(path)?;
        let ids = df.column("problem_id")?.i64()?;
        let scores = df.column("score")?.i64()?;
        let mut out = BTreeMap::new();
        for (id, score) in ids.into_iter().zip(scores.into_iter()) {
            if let (Some(id), Some(score)) = (id, score) {
                let score = score.max(0) as u64;
                out.entry(id)
                    .and_modify(|s: &mut u64| *s = (*s).min(score))
                    .or_insert(score);
            }
        }
        tracing::info!(path = %path.display(), problems = out.len(), "baseline loaded");
        Ok(Self { scores: out })
    }

    /// Best known score; `None` means unbounded.
    pub fn bound(&self, problem_id: i64) -> Option<u64> {
        self.scores.get(&problem_id).copied()
    }

    /// Strictly better than the recorded score, or no record at all.
    pub fn improves(&self, problem_id: i64, score: u64) -> bool {
        self.bound(problem_id).map_or(true, |b| score < b)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }
}

/// Baseline CSV with both columns cast to `i64`.
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let lf = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(100))
        .finish()
        .with_context(|| format!("reading baseline {}", path.display()))?;
    let df = lf
        .select([
            col("problem_id").cast(DataType::Int64),
            col("score").cast(DataType::Int64),
        ])
        .collect()
        .with_context(|| {
            format!("baseline {} needs problem_id and score columns", path.display())
        })?;
    Ok(df)
}
