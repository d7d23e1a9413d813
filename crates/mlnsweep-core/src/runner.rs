//! The sweep driver.
//!
//! Iteration `i` (1-based) writes the template plus the first `i` evidence
//! literals to a fresh input file, runs the solver on it synchronously and
//! sends its stdout to `<logs_dir>/<i>.log`. Iterations never overlap.

use crate::check::check_evidence;
use crate::errors::{SweepError, SweepResult};
use crate::evidence::Evidence;
use crate::input::InputWriter;
use crate::report::{IterationStatus, SweepReport};
use crate::solver::{InvokeOptions, SolverCommand};
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What to do after an iteration whose solver run did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and move on to the next iteration.
    #[default]
    Continue,
    /// Record the failure and stop the sweep.
    Abort,
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub template: Template,
    pub evidence: Evidence,
    pub logs_dir: PathBuf,
    pub create_logs_dir: bool,
    pub input: InputWriter,
    pub solver: SolverCommand,
    pub invoke: InvokeOptions,
    pub on_failure: FailurePolicy,
    /// Delete each input file after its solver run instead of leaving it in
    /// the temp dir.
    pub cleanup_inputs: bool,
    /// Run [`check_evidence`] before the first iteration.
    pub check: bool,
    /// First iteration to run (1-based). Defaults to 1.
    pub start: Option<usize>,
    /// Last iteration to run (inclusive). Defaults to the evidence length.
    pub end: Option<usize>,
}

impl SweepConfig {
    pub fn new(template: Template, evidence: Evidence, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            template,
            evidence,
            logs_dir: logs_dir.into(),
            create_logs_dir: false,
            input: InputWriter::default(),
            solver: SolverCommand::default(),
            invoke: InvokeOptions::default(),
            on_failure: FailurePolicy::default(),
            cleanup_inputs: false,
            check: false,
            start: None,
            end: None,
        }
    }

    /// Iterations this config will run.
    pub fn iterations(&self) -> SweepResult<RangeInclusive<usize>> {
        iteration_range(self.evidence.len(), self.start, self.end)
    }

    pub fn log_path(&self, index: usize) -> PathBuf {
        log_path(&self.logs_dir, index)
    }
}

/// `<logs_dir>/<index>.log`
pub fn log_path(logs_dir: &Path, index: usize) -> PathBuf {
    logs_dir.join(format!("{index}.log"))
}

pub fn iteration_range(
    len: usize,
    start: Option<usize>,
    end: Option<usize>,
) -> SweepResult<RangeInclusive<usize>> {
    if len == 0 {
        return Err(SweepError::EmptyEvidence);
    }
    let start = start.unwrap_or(1);
    let end = end.unwrap_or(len);
    if start == 0 || start > end || end > len {
        return Err(SweepError::InvalidRange { start, end, len });
    }
    Ok(start..=end)
}

fn prepare_logs_dir(cfg: &SweepConfig) -> SweepResult<()> {
    if cfg.logs_dir.is_dir() {
        return Ok(());
    }
    if !cfg.create_logs_dir {
        return Err(SweepError::MissingLogsDir {
            path: cfg.logs_dir.clone(),
        });
    }
    std::fs::create_dir_all(&cfg.logs_dir).map_err(|source| SweepError::OpenLog {
        path: cfg.logs_dir.clone(),
        source,
    })?;
    tracing::info!(logs_dir = %cfg.logs_dir.display(), "created logs directory");
    Ok(())
}

/// Run the configured iterations in order.
///
/// Only setup problems (range, pre-flight, logs dir) are returned as errors.
/// Once iterations start, every outcome lands in the report, including the
/// error that stopped the sweep.
pub fn run_sweep(cfg: &SweepConfig) -> SweepResult<SweepReport> {
    let range = cfg.iterations()?;

    if cfg.check {
        let problems = check_evidence(&cfg.template, &cfg.evidence);
        if !problems.is_empty() {
            return Err(SweepError::Preflight {
                problems: problems.iter().map(|p| p.to_string()).collect(),
            });
        }
    }

    prepare_logs_dir(cfg)?;

    let mut report = SweepReport::new(cfg.template.name(), cfg.evidence.len());
    tracing::info!(
        template = cfg.template.name(),
        first = *range.start(),
        last = *range.end(),
        logs_dir = %cfg.logs_dir.display(),
        "starting sweep"
    );

    for index in range {
        let started = Instant::now();
        let log = cfg.log_path(index);

        let status = run_iteration(cfg, index, &log, &mut report);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let detail = report
            .iterations
            .last()
            .and_then(|r| r.message.clone())
            .unwrap_or_default();
        if status == IterationStatus::Error {
            // An input or log failure ends the sweep under either policy.
            tracing::error!(iteration = index, log = %log.display(), "sweep stopped: {}", detail);
            report.summary.aborted = true;
            break;
        }
        if status.is_success() {
            tracing::info!(iteration = index, log = %log.display(), elapsed_ms, "solver finished");
        } else {
            tracing::warn!(
                iteration = index,
                status = ?status,
                log = %log.display(),
                "solver did not succeed: {}",
                detail
            );
            if cfg.on_failure == FailurePolicy::Abort {
                report.summary.aborted = true;
                break;
            }
        }
    }

    tracing::info!(
        total = report.summary.total,
        succeeded = report.summary.succeeded,
        "sweep complete"
    );
    Ok(report)
}

/// One iteration: write input `index`, run the solver on it, record the outcome.
fn run_iteration(
    cfg: &SweepConfig,
    index: usize,
    log: &Path,
    report: &mut SweepReport,
) -> IterationStatus {
    // The input is complete and closed before the solver starts.
    let input = match cfg.input.write(&cfg.template, cfg.evidence.prefix(index)) {
        Ok(input) => input,
        Err(err) => return report.add_error(index, None, log.to_path_buf(), &err),
    };

    let outcome = cfg.solver.invoke(&input, log, &cfg.invoke);

    let input_path = if cfg.cleanup_inputs {
        if let Err(e) = input.close() {
            tracing::warn!("failed to remove input file: {}", e);
        }
        None
    } else {
        match input.keep() {
            Ok(path) => Some(path),
            Err(e) => {
                let err = SweepError::WriteInput {
                    path: e.path.to_path_buf(),
                    source: e.error,
                };
                return report.add_error(index, None, log.to_path_buf(), &err);
            }
        }
    };

    match outcome {
        Ok(inv) => report.add_invocation(index, input_path, log.to_path_buf(), &inv),
        Err(err) => report.add_error(index, input_path, log.to_path_buf(), &err),
    }
}
