//! Error types for the sweep driver.

use std::path::PathBuf;

/// Sweep errors.
///
/// Solver exit codes and timeouts are not errors; they are recorded per
/// iteration in [`crate::report::SweepReport`].
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// No evidence literals to sweep over.
    #[error("evidence list is empty")]
    EmptyEvidence,

    /// An evidence line could not be parsed.
    #[error("invalid evidence literal on line {line}: {literal:?} ({reason})")]
    InvalidLiteral {
        line: usize,
        literal: String,
        reason: String,
    },

    /// Template name is not one of the built-in variants.
    #[error("unknown template: {name} (available: {available})")]
    UnknownTemplate { name: String, available: String },

    /// Logs directory does not exist and creation was not requested.
    #[error("logs directory does not exist: {}", .path.display())]
    MissingLogsDir { path: PathBuf },

    /// Iteration range does not fit the evidence list.
    #[error("invalid iteration range {start}..={end} for {len} evidence literals")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// Pre-flight check found evidence the template cannot accept.
    #[error(
        "pre-flight check failed with {} problem(s): {}",
        .problems.len(),
        .problems.join("; ")
    )]
    Preflight { problems: Vec<String> },

    /// Temporary input file could not be created.
    #[error("failed to create temporary input file: {source}")]
    TempFile {
        #[source]
        source: std::io::Error,
    },

    /// Writing or flushing the input file failed.
    #[error("failed to write input file {}: {source}", .path.display())]
    WriteInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Log file could not be opened for writing.
    #[error("failed to open log file {}: {source}", .path.display())]
    OpenLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Solver process could not be started.
    #[error("failed to launch solver {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the solver process failed.
    #[error("failed to wait for solver: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl SweepError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Launch { .. } => 1,
            _ => 2,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result alias for sweep operations.
pub type SweepResult<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_failure_maps_to_command_failed() {
        let err = SweepError::Launch {
            program: "forclift".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("forclift"));
    }

    #[test]
    fn config_errors_map_to_exit_two() {
        assert_eq!(SweepError::EmptyEvidence.exit_code(), 2);
        assert_eq!(SweepError::config("bad").exit_code(), 2);
        let missing = SweepError::MissingLogsDir {
            path: PathBuf::from("logs/x"),
        };
        assert_eq!(missing.to_string(), "logs directory does not exist: logs/x");
    }
}
