use anyhow::{Context, Result};
use blockpaint::{parse_program, solve, PipelineKind, ProgramState};
use clap::{Parser, Subcommand};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::SubscriberBuilder;

mod baseline;
mod params;
mod provenance;
mod sweep;
mod target;

use baseline::Baseline;
use params::ParamsDoc;
use provenance::{write_sidecar, Payload};
use sweep::{run_sweep, RunRecord, SweepGrid, SweepLimits};

#[derive(Parser)]
#[command(name = "blockpaint")]
#[command(about = "Synthesize and score block-canvas painting programs")]
struct Cmd {
    /// Debug-level logging (pipeline stages, per-run timings)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Args)]
struct ParamArgs {
    /// JSON file with solver parameters; flags below override it
    #[arg(long)]
    params: Option<PathBuf>,
    #[arg(long)]
    cut_limit: Option<u64>,
    #[arg(long)]
    merge_limit: Option<u64>,
    #[arg(long)]
    bucket_size: Option<u8>,
    /// average, median or mode
    #[arg(long)]
    color_method: Option<String>,
    #[arg(long)]
    snap: bool,
    #[arg(long)]
    only_if_improves: bool,
    #[arg(long)]
    seed: Option<u64>,
}

impl ParamArgs {
    fn resolve(&self) -> Result<ParamsDoc> {
        let mut doc = match &self.params {
            Some(path) => {
                let raw = std::fs::read(path)
                    .with_context(|| format!("reading params {}", path.display()))?;
                serde_json::from_slice(&raw)
                    .with_context(|| format!("parsing params {}", path.display()))?
            }
            None => ParamsDoc::default(),
        };
        if let Some(v) = self.cut_limit {
            doc.cut_limit = v;
        }
        if let Some(v) = self.merge_limit {
            doc.merge_limit = v;
        }
        if let Some(v) = self.bucket_size {
            doc.bucket_size = v;
        }
        if let Some(v) = &self.color_method {
            doc.color_method = v.clone();
        }
        if let Some(v) = self.seed {
            doc.seed = v;
        }
        doc.snap |= self.snap;
        doc.only_if_improves |= self.only_if_improves;
        Ok(doc)
    }
}

#[derive(Subcommand)]
enum Action {
    /// Run one pipeline on a target PNG and write the program
    Solve {
        #[arg(long)]
        target: PathBuf,
        #[arg(long, default_value = "autocrop-cut")]
        pipeline: PipelineKind,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
        /// CSV of best known scores (problem_id,score)
        #[arg(long)]
        baseline: Option<PathBuf>,
        /// Defaults to the numeric stem of the target file
        #[arg(long)]
        problem_id: Option<i64>,
        /// Also write the rendered canvas as PNG
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Replay a program against a target and print its score
    Score {
        #[arg(long)]
        target: PathBuf,
        #[arg(long)]
        program: PathBuf,
    },
    /// Run a parameter grid in parallel and keep the best program
    Sweep {
        #[arg(long)]
        target: PathBuf,
        /// JSON sweep grid; the built-in grid when absent
        #[arg(long)]
        grid: Option<PathBuf>,
        #[arg(long)]
        deadline_secs: Option<u64>,
        #[arg(long)]
        max_runs: Option<usize>,
        #[arg(long)]
        threads: Option<usize>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        baseline: Option<PathBuf>,
        #[arg(long)]
        problem_id: Option<i64>,
    },
    /// Summarise sweep results per problem against a baseline
    Report {
        /// One or more `*.runs.json` files written by `sweep`
        #[arg(long, num_args = 1.., required = true)]
        runs: Vec<PathBuf>,
        #[arg(long)]
        baseline: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .init();
    match cmd.action {
        Action::Solve {
            target,
            pipeline,
            out,
            params,
            baseline,
            problem_id,
            preview,
        } => solve_cmd(
            &target,
            pipeline,
            &out,
            &params,
            baseline.as_deref(),
            problem_id,
            preview.as_deref(),
        ),
        Action::Score { target, program } => score_cmd(&target, &program),
        Action::Sweep {
            target,
            grid,
            deadline_secs,
            max_runs,
            threads,
            out,
            baseline,
            problem_id,
        } => sweep_cmd(
            &target,
            grid.as_deref(),
            SweepLimits {
                deadline: deadline_secs.map(Duration::from_secs),
                max_runs,
            },
            threads,
            &out,
            baseline.as_deref(),
            problem_id,
        ),
        Action::Report { runs, baseline } => report_cmd(&runs, baseline.as_deref()),
    }
}

fn load(target: &Path) -> Result<Arc<blockpaint::TargetImage>> {
    let img = target::load_target(target)?;
    tracing::info!(
        path = %target.display(),
        width = img.width(),
        height = img.height(),
        "target loaded"
    );
    Ok(Arc::new(img))
}

fn write_program(out: &Path, state: &ProgramState) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut text = state.program_text();
    text.push('\n');
    std::fs::write(out, text).with_context(|| format!("writing {}", out.display()))
}

fn solve_cmd(
    target_path: &Path,
    pipeline: PipelineKind,
    out: &Path,
    params: &ParamArgs,
    baseline: Option<&Path>,
    problem_id: Option<i64>,
    preview: Option<&Path>,
) -> Result<()> {
    let doc = params.resolve()?;
    let solver = doc.to_solver()?;
    let problem_id = problem_id.or_else(|| target::problem_id_from(target_path));
    let img = load(target_path)?;
    let state = solve(pipeline, &solver, img, None)
        .with_context(|| format!("pipeline {pipeline} failed"))?;
    let score = state.score();
    tracing::info!(
        %pipeline,
        moves = state.len(),
        cost = score.cost,
        similarity = score.similarity,
        total = score.total(),
        "solved"
    );

    if let (Some(path), Some(id)) = (baseline, problem_id) {
        let base = Baseline::load(path)?;
        match base.bound(id) {
            Some(best) if score.total() >= best => {
                tracing::info!(problem_id = id, best, total = score.total(), "no improvement")
            }
            bound => tracing::info!(
                problem_id = id,
                best = ?bound,
                total = score.total(),
                "improves baseline"
            ),
        }
    }

    write_program(out, &state)?;
    let sidecar = write_sidecar(
        out,
        &Payload {
            problem_id,
            pipeline: pipeline.to_string(),
            params: serde_json::to_value(&doc)?,
            score,
        },
    )?;
    if let Some(path) = preview {
        target::save_preview(state.canvas(), path)?;
    }
    tracing::info!(out = %out.display(), sidecar = %sidecar.display(), "written");
    Ok(())
}

fn score_cmd(target_path: &Path, program: &Path) -> Result<()> {
    let img = load(target_path)?;
    let text = std::fs::read_to_string(program)
        .with_context(|| format!("reading {}", program.display()))?;
    let moves = parse_program(&text).with_context(|| format!("parsing {}", program.display()))?;
    let state = ProgramState::new(img)
        .apply_all(moves)
        .with_context(|| format!("replaying {}", program.display()))?;
    let score = state.score();
    let obj = serde_json::json!({
        "moves": state.len(),
        "cost": score.cost,
        "similarity": score.similarity,
        "total": score.total(),
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

fn runs_path(out: &Path) -> PathBuf {
    out.with_extension("runs.json")
}

fn sweep_cmd(
    target_path: &Path,
    grid: Option<&Path>,
    limits: SweepLimits,
    threads: Option<usize>,
    out: &Path,
    baseline: Option<&Path>,
    problem_id: Option<i64>,
) -> Result<()> {
    let grid: SweepGrid = match grid {
        Some(path) => {
            let raw =
                std::fs::read(path).with_context(|| format!("reading grid {}", path.display()))?;
            serde_json::from_slice(&raw)
                .with_context(|| format!("parsing grid {}", path.display()))?
        }
        None => SweepGrid::default(),
    };
    let specs = grid.expand()?;
    let problem_id = problem_id.or_else(|| target::problem_id_from(target_path));
    let img = load(target_path)?;
    tracing::info!(runs = specs.len(), ?limits, "sweep");

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        pool = pool.num_threads(n);
    }
    let pool = pool.build().context("building thread pool")?;
    let outcome = pool.install(|| run_sweep(img, specs, limits, problem_id));
    tracing::info!(
        finished = outcome.records.len(),
        skipped = outcome.skipped,
        "sweep done"
    );

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let runs = runs_path(out);
    std::fs::write(&runs, serde_json::to_vec_pretty(&outcome.records)?)
        .with_context(|| format!("writing {}", runs.display()))?;

    let Some((spec, state)) = outcome.best else {
        tracing::warn!("no run finished; nothing written besides the run log");
        return Ok(());
    };
    let score = state.score();
    let base = baseline.map(Baseline::load).transpose()?;
    let improves = match (&base, problem_id) {
        (Some(b), Some(id)) => b.improves(id, score.total()),
        _ => true,
    };
    if !improves {
        tracing::info!(total = score.total(), "best run does not beat the baseline");
        return Ok(());
    }
    write_program(out, &state)?;
    write_sidecar(
        out,
        &Payload {
            problem_id,
            pipeline: spec.pipeline.to_string(),
            params: serde_json::to_value(&spec.params)?,
            score,
        },
    )?;
    tracing::info!(
        pipeline = %spec.pipeline,
        total = score.total(),
        out = %out.display(),
        "best program written"
    );
    Ok(())
}

fn report_cmd(runs: &[PathBuf], baseline: Option<&Path>) -> Result<()> {
    let mut records: Vec<RunRecord> = Vec::new();
    for path in runs {
        let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let mut batch: Vec<RunRecord> = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        records.append(&mut batch);
    }
    let df = runs_frame(&records)?;
    let summary = summarise(df, baseline)?;
    println!("{summary}");
    Ok(())
}

fn runs_frame(records: &[RunRecord]) -> Result<DataFrame> {
    let ids: Vec<Option<i64>> = records.iter().map(|r| r.problem_id).collect();
    let pipelines: Vec<&str> = records.iter().map(|r| r.pipeline.as_str()).collect();
    let totals: Vec<i64> = records.iter().map(|r| r.total as i64).collect();
    Ok(df!(
        "problem_id" => ids,
        "pipeline" => pipelines,
        "total" => totals
    )?)
}

/// Best total per problem, with the baseline score and the gap when known.
fn summarise(runs: DataFrame, baseline: Option<&Path>) -> Result<DataFrame> {
    let mut lf = runs
        .lazy()
        .group_by([col("problem_id")])
        .agg([
            col("total").min().alias("best"),
            col("pipeline")
                .sort_by([col("total")], SortMultipleOptions::default())
                .first()
                .alias("pipeline"),
            col("total").count().alias("runs"),
        ]);
    if let Some(path) = baseline {
        let base = baseline::read_frame(path)?
            .lazy()
            .group_by([col("problem_id")])
            .agg([col("score").min()]);
        lf = lf
            .join(
                base,
                [col("problem_id")],
                [col("problem_id")],
                JoinArgs::new(JoinType::Left),
            )
            .with_column((col("best") - col("score")).alias("delta"));
    }
    let df = lf
        .sort(["problem_id"], SortMultipleOptions::default())
        .collect()?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: i64, pipeline: &str, total: u64) -> RunRecord {
        RunRecord {
            problem_id: Some(id),
            pipeline: pipeline.into(),
            params: ParamsDoc::default(),
            total,
            cost: total / 2,
            similarity: total - total / 2,
            moves: 3,
            millis: 1,
        }
    }

    #[test]
    fn summary_takes_minimum_and_joins_baseline() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("best.csv");
        std::fs::write(&csv, "problem_id,score\n1,900\n").unwrap();
        let df = runs_frame(&[
            record(2, "grid-cut", 700),
            record(1, "grid-cut", 1000),
            record(1, "rect-crop", 800),
        ])
        .unwrap();
        let out = summarise(df, Some(&csv)).unwrap();
        assert_eq!(out.height(), 2);
        let best = out.column("best").unwrap().i64().unwrap();
        assert_eq!(best.get(0), Some(800));
        assert_eq!(best.get(1), Some(700));
        let pipe = out.column("pipeline").unwrap().str().unwrap();
        assert_eq!(pipe.get(0), Some("rect-crop"));
        let delta = out.column("delta").unwrap().i64().unwrap();
        assert_eq!(delta.get(0), Some(-100));
        assert_eq!(delta.get(1), None);
    }

    #[test]
    fn runs_file_sits_next_to_the_program() {
        assert_eq!(
            runs_path(Path::new("out/7.isl")),
            Path::new("out/7.runs.json")
        );
    }
}
