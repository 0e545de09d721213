//! `<stem>.provenance.json` sidecars next to written programs.

use anyhow::{Context, Result};
use blockpaint::Score;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What produced a solution file.
pub struct Payload {
    pub problem_id: Option<i64>,
    pub pipeline: String,
    pub params: Value,
    pub score: Score,
}

#[derive(Serialize)]
struct ScoreDoc {
    total: u64,
    cost: u64,
    similarity: u64,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    code_rev: String,
    version: &'static str,
    problem_id: Option<i64>,
    pipeline: &'a str,
    params: &'a Value,
    score: ScoreDoc,
    outputs: Vec<String>,
}

pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: &Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let path = provenance_path(artifact);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let doc = Sidecar {
        code_rev: current_git_rev(),
        version: blockpaint::VERSION,
        problem_id: payload.problem_id,
        pipeline: &payload.pipeline,
        params: &payload.params,
        score: ScoreDoc {
            total: payload.score.total(),
            cost: payload.score.cost,
            similarity: payload.score.similarity,
        },
        outputs: vec![artifact.to_string_lossy().into_owned()],
    };
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("solution");
    artifact.with_file_name(format!("{stem}.provenance.json"))
}

/// Build-time `GIT_COMMIT`, then the runtime variable, then `git rev-parse`.
pub fn current_git_rev() -> String {
    let from_env = option_env!("GIT_COMMIT")
        .map(str::to_string)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|s| !s.is_empty());
    from_env
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_string())
}

fn git_head() -> Option<String> {
    let out = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}
