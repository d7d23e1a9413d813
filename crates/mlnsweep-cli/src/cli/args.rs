use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use mlnsweep_core::{FailurePolicy, SweepFile};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mlnsweep",
    version,
    about = "Run an MLN solver over growing evidence prefixes, one log per prefix"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate one input per evidence prefix and run the solver on each
    Run(RunArgs),
    /// Print the generated input for a single iteration
    Render(RenderArgs),
    /// Check evidence against the template's declarations
    Check(CheckArgs),
    /// List built-in templates, or print one
    Templates(TemplatesArgs),
    Version,
}

/// Where the template and evidence come from.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Sweep config (YAML); flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Built-in template: stress-drinkers | smokers-drinkers | friends-smokers
    #[arg(long, conflicts_with = "template_file")]
    pub template: Option<String>,

    /// Read the template verbatim from a file
    #[arg(long)]
    pub template_file: Option<PathBuf>,

    /// Evidence literals, one per line (`//` comments allowed)
    #[arg(long)]
    pub evidence_file: Option<PathBuf>,
}

impl SourceArgs {
    /// Config file (or defaults) with the source flags applied.
    pub fn load(&self) -> Result<SweepFile> {
        let mut file = match &self.config {
            Some(path) => SweepFile::from_file(path)?,
            None => SweepFile::default(),
        };
        if let Some(name) = &self.template {
            file.template = Some(name.clone());
            file.template_file = None;
        }
        if let Some(path) = &self.template_file {
            file.template_file = Some(path.clone());
            file.template = None;
        }
        if let Some(path) = &self.evidence_file {
            file.evidence_file = Some(path.clone());
            file.evidence = None;
        }
        Ok(file)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnFailure {
    Continue,
    Abort,
}

impl From<OnFailure> for FailurePolicy {
    fn from(value: OnFailure) -> Self {
        match value {
            OnFailure::Continue => FailurePolicy::Continue,
            OnFailure::Abort => FailurePolicy::Abort,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Directory for `<i>.log` files [default: logs/<template>]
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,

    /// Create the logs directory if it does not exist
    #[arg(long)]
    pub create_logs_dir: bool,

    /// Directory for generated inputs [default: system temp dir]
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Solver program [default: java]
    #[arg(long, env = "MLNSWEEP_SOLVER")]
    pub solver: Option<PathBuf>,

    /// Arguments placed before the fixed flags; replaces the default
    /// `-jar target/scala-2.11/forclift.jar` (repeatable)
    #[arg(long = "solver-arg", allow_hyphen_values = true)]
    pub solver_args: Vec<String>,

    /// Kill a solver run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Send solver stderr into the log file too
    #[arg(long)]
    pub merge_stderr: bool,

    /// Echo solver stderr and keep its tail in the report
    #[arg(long, conflicts_with = "merge_stderr")]
    pub capture_stderr: bool,

    /// What to do when a solver run fails
    #[arg(long, value_enum)]
    pub on_failure: Option<OnFailure>,

    /// First iteration to run (1-based)
    #[arg(long)]
    pub start: Option<usize>,

    /// Last iteration to run (inclusive)
    #[arg(long)]
    pub end: Option<usize>,

    /// Delete generated inputs after each solver run
    #[arg(long)]
    pub cleanup_inputs: bool,

    /// Check evidence against the template before running
    #[arg(long)]
    pub check: bool,

    /// Write a JSON report of all iterations
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the effective config and exit
    #[arg(long)]
    pub print_config: bool,
}

impl RunArgs {
    /// Config file plus every flag given on the command line.
    pub fn sweep_file(&self) -> Result<SweepFile> {
        let mut file = self.source.load()?;
        if let Some(dir) = &self.logs_dir {
            file.logs_dir = Some(dir.clone());
        }
        if self.create_logs_dir {
            file.create_logs_dir = true;
        }
        if let Some(dir) = &self.temp_dir {
            file.temp_dir = Some(dir.clone());
        }
        if let Some(program) = &self.solver {
            file.solver.program = Some(program.clone());
        }
        if !self.solver_args.is_empty() {
            file.solver.prefix_args = Some(self.solver_args.clone());
        }
        if let Some(secs) = self.timeout_secs {
            file.solver.timeout_secs = Some(secs);
        }
        if self.merge_stderr {
            file.solver.merge_stderr = true;
            file.solver.capture_stderr = false;
        }
        if self.capture_stderr {
            file.solver.capture_stderr = true;
            file.solver.merge_stderr = false;
        }
        if let Some(policy) = self.on_failure {
            file.on_failure = policy.into();
        }
        if self.start.is_some() {
            file.start = self.start;
        }
        if self.end.is_some() {
            file.end = self.end;
        }
        if self.cleanup_inputs {
            file.cleanup_inputs = true;
        }
        if self.check {
            file.check = true;
        }
        file.validate()?;
        Ok(file)
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Iteration to render (1-based): template plus that many literals
    #[arg(long, short = 'i')]
    pub iteration: usize,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TemplatesArgs {
    /// Print this template's text instead of listing
    pub name: Option<String>,
}
