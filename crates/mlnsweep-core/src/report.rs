use crate::errors::SweepError;
use crate::solver::Invocation;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize, Clone)]
pub struct SweepReport {
    pub template: String,
    pub evidence_len: usize,
    pub summary: SweepSummary,
    pub iterations: Vec<IterationResult>,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct SweepSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub launch_errors: usize,
    /// Iterations cut short by a filesystem or process error.
    pub errors: usize,
    /// Set when the sweep stopped early, by failure policy or on an error.
    pub aborted: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct IterationResult {
    /// 1-based; also the log file stem.
    pub index: usize,
    pub literals: usize,
    pub input: Option<PathBuf>,
    pub log: PathBuf,
    pub status: IterationStatus,
    pub exit_code: Option<i32>,
    pub message: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IterationStatus {
    Succeeded,   // Exit code 0
    Failed,      // Non-zero exit or killed by signal
    TimedOut,    // Killed after the configured timeout
    LaunchError, // Solver could not be started
    Error,       // Input, log or wait failure; the sweep stops here
}

impl IterationStatus {
    pub fn is_success(self) -> bool {
        self == IterationStatus::Succeeded
    }
}

impl SweepReport {
    pub fn new(template: &str, evidence_len: usize) -> Self {
        Self {
            template: template.to_string(),
            evidence_len,
            summary: SweepSummary::default(),
            iterations: Vec::new(),
        }
    }

    pub fn add_result(&mut self, result: IterationResult) {
        self.summary.total += 1;
        match result.status {
            IterationStatus::Succeeded => self.summary.succeeded += 1,
            IterationStatus::Failed => self.summary.failed += 1,
            IterationStatus::TimedOut => self.summary.timed_out += 1,
            IterationStatus::LaunchError => self.summary.launch_errors += 1,
            IterationStatus::Error => self.summary.errors += 1,
        }
        self.iterations.push(result);
    }

    /// Record a completed solver run.
    pub fn add_invocation(
        &mut self,
        index: usize,
        input: Option<PathBuf>,
        log: PathBuf,
        inv: &Invocation,
    ) -> IterationStatus {
        let status = if inv.timed_out {
            IterationStatus::TimedOut
        } else if inv.success {
            IterationStatus::Succeeded
        } else {
            IterationStatus::Failed
        };
        let stderr = inv.stderr_tail.trim();
        let message = match (status, stderr.is_empty()) {
            (IterationStatus::TimedOut, true) => Some("solver timed out".to_string()),
            (IterationStatus::TimedOut, false) => Some(format!("solver timed out: {stderr}")),
            (_, true) => None,
            (_, false) => Some(stderr.to_string()),
        };
        self.add_result(IterationResult {
            index,
            literals: index,
            input,
            log,
            status,
            exit_code: inv.exit_code,
            message,
            duration_ms: inv.duration.as_millis() as u64,
        });
        status
    }

    /// Record an iteration that produced no solver outcome.
    pub fn add_error(
        &mut self,
        index: usize,
        input: Option<PathBuf>,
        log: PathBuf,
        err: &SweepError,
    ) -> IterationStatus {
        let status = match err {
            SweepError::Launch { .. } => IterationStatus::LaunchError,
            _ => IterationStatus::Error,
        };
        self.add_result(IterationResult {
            index,
            literals: index,
            input,
            log,
            status,
            exit_code: None,
            message: Some(err.to_string()),
            duration_ms: 0,
        });
        status
    }

    /// True when every recorded iteration succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.summary.succeeded == self.summary.total && !self.summary.aborted
    }
}
