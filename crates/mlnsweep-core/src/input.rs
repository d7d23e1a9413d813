//! Generated solver input files.
//!
//! Each iteration gets a fresh temp file holding the template followed by an
//! evidence prefix. The handle is flushed, synced and closed before the path
//! is handed out, so the solver never sees a partial file.

use crate::errors::{SweepError, SweepResult};
use crate::evidence::EvidenceLiteral;
use crate::template::Template;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tempfile::TempPath;

/// Template text followed by one literal per line.
pub fn render_input(template: &Template, literals: &[EvidenceLiteral]) -> String {
    let mut out = String::with_capacity(
        template.text().len() + literals.iter().map(|l| l.as_str().len() + 1).sum::<usize>(),
    );
    out.push_str(template.text());
    for lit in literals {
        out.push_str(lit.as_str());
        out.push('\n');
    }
    out
}

/// Creates uniquely named input files.
#[derive(Debug, Clone)]
pub struct InputWriter {
    /// Directory for input files; the platform temp dir when `None`.
    pub dir: Option<PathBuf>,
    pub prefix: String,
    pub suffix: String,
}

impl Default for InputWriter {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: "mlnsweep-".to_string(),
            suffix: ".mln".to_string(),
        }
    }
}

impl InputWriter {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Write `template` plus `literals` to a new file.
    ///
    /// The returned [`TempPath`] deletes the file on drop; call
    /// [`TempPath::keep`] to leave it on disk.
    pub fn write(
        &self,
        template: &Template,
        literals: &[EvidenceLiteral],
    ) -> SweepResult<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.prefix).suffix(&self.suffix);
        let tmp = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|source| SweepError::TempFile { source })?;

        let path = tmp.path().to_path_buf();
        let write_err = |source| SweepError::WriteInput {
            path: path.clone(),
            source,
        };

        {
            let mut w = BufWriter::new(tmp.as_file());
            w.write_all(template.text().as_bytes()).map_err(write_err)?;
            for lit in literals {
                w.write_all(lit.as_str().as_bytes()).map_err(write_err)?;
                w.write_all(b"\n").map_err(write_err)?;
            }
            w.flush().map_err(write_err)?;
        }
        tmp.as_file().sync_all().map_err(write_err)?;

        Ok(tmp.into_temp_path())
    }
}
