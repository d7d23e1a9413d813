//! Sweep configuration file (YAML).
//!
//! Every field is optional. Command-line flags are applied on top of the file
//! and built-in defaults fill whatever is left. Relative paths are resolved
//! against the working directory.

use crate::errors::SweepError;
use crate::evidence::{Evidence, EvidenceLiteral};
use crate::input::InputWriter;
use crate::runner::{FailurePolicy, SweepConfig};
use crate::solver::{InvokeOptions, SolverCommand};
use crate::template::{Template, TemplateVariant};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parent of the per-template log directories.
pub const DEFAULT_LOGS_ROOT: &str = "logs";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepFile {
    /// Built-in template name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_file: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<EvidenceLiteral>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_file: Option<PathBuf>,

    /// Defaults to `logs/<template name>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_dir: Option<PathBuf>,
    pub create_logs_dir: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,

    pub solver: SolverSection,

    pub on_failure: FailurePolicy,
    pub cleanup_inputs: bool,
    pub check: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    pub merge_stderr: bool,
    pub capture_stderr: bool,
}

impl SweepFile {
    /// Load a sweep config from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read sweep config: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("invalid sweep config: {}", path.display()))
    }

    /// Parse a sweep config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document is a valid, all-defaults config.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: Self = serde_yaml::from_str(yaml).context("failed to parse sweep config YAML")?;
        file.validate()?;
        Ok(file)
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        if self.template.is_some() && self.template_file.is_some() {
            return Err(SweepError::config(
                "`template` and `template_file` are mutually exclusive",
            ));
        }
        if self.evidence.is_some() && self.evidence_file.is_some() {
            return Err(SweepError::config(
                "`evidence` and `evidence_file` are mutually exclusive",
            ));
        }
        if self.solver.merge_stderr && self.solver.capture_stderr {
            return Err(SweepError::config(
                "`solver.merge_stderr` and `solver.capture_stderr` are mutually exclusive",
            ));
        }
        if self.solver.timeout_secs == Some(0) {
            return Err(SweepError::config("`solver.timeout_secs` must be > 0"));
        }
        Ok(())
    }

    pub fn load_template(&self) -> Result<Template> {
        match (&self.template, &self.template_file) {
            (_, Some(path)) => Template::from_file(path),
            (Some(name), None) => Ok(Template::builtin(TemplateVariant::from_name(name)?)),
            (None, None) => Ok(Template::builtin(TemplateVariant::default())),
        }
    }

    pub fn load_evidence(&self) -> Result<Evidence> {
        match (&self.evidence, &self.evidence_file) {
            (_, Some(path)) => Evidence::from_file(path),
            (Some(literals), None) => Ok(Evidence::from_literals(literals.clone())),
            (None, None) => Ok(Evidence::builtin()),
        }
    }

    pub fn solver_command(&self) -> SolverCommand {
        let defaults = SolverCommand::default();
        SolverCommand {
            program: self.solver.program.clone().unwrap_or(defaults.program),
            prefix_args: self
                .solver
                .prefix_args
                .clone()
                .unwrap_or(defaults.prefix_args),
            flags: self.solver.flags.clone().unwrap_or(defaults.flags),
        }
    }

    /// Load template and evidence and produce the runnable config.
    pub fn resolve(&self) -> Result<SweepConfig> {
        self.validate()?;
        let template = self.load_template()?;
        let evidence = self.load_evidence()?;
        let logs_dir = self
            .logs_dir
            .clone()
            .unwrap_or_else(|| Path::new(DEFAULT_LOGS_ROOT).join(template.name()));

        let input = InputWriter {
            dir: self.temp_dir.clone(),
            ..InputWriter::default()
        };

        Ok(SweepConfig {
            template,
            evidence,
            logs_dir,
            create_logs_dir: self.create_logs_dir,
            input,
            solver: self.solver_command(),
            invoke: InvokeOptions {
                timeout: self.solver.timeout_secs.map(Duration::from_secs),
                merge_stderr: self.solver.merge_stderr,
                capture_stderr: self.solver.capture_stderr,
            },
            on_failure: self.on_failure,
            cleanup_inputs: self.cleanup_inputs,
            check: self.check,
            start: self.start,
            end: self.end,
        })
    }
}
