//! Evidence sweeps for MLN solvers.
//!
//! Builds one solver input per evidence prefix (template + first `i`
//! literals) and runs an external solver on each, logging to `<i>.log`.

pub mod check;
pub mod config;
pub mod errors;
pub mod evidence;
pub mod input;
pub mod report;
pub mod runner;
pub mod solver;
pub mod template;

pub use check::{check_evidence, Problem};
pub use config::SweepFile;
pub use errors::{SweepError, SweepResult};
pub use evidence::{Evidence, EvidenceLiteral};
pub use input::{render_input, InputWriter};
pub use report::{IterationResult, IterationStatus, SweepReport, SweepSummary};
pub use runner::{run_sweep, FailurePolicy, SweepConfig};
pub use solver::{Invocation, InvokeOptions, SolverCommand};
pub use template::{Template, TemplateVariant};
