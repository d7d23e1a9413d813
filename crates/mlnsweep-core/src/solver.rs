//! External solver invocation.
//!
//! The solver is run synchronously with the generated input path as its last
//! argument. Its stdout is redirected into the iteration's log file
//! (truncating any previous content). Stderr goes to our own stderr unless
//! it is merged into the log or captured. The exit status is always captured.

use crate::errors::{SweepError, SweepResult};
use serde::Serialize;
use std::fs::File;
use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Flags every invocation carries, ahead of the input path.
pub const DEFAULT_FLAGS: &[&str] = &["-z", "--format-in", "mln"];
pub const DEFAULT_PROGRAM: &str = "java";
pub const DEFAULT_PREFIX_ARGS: &[&str] = &["-jar", "target/scala-2.11/forclift.jar"];

/// Bytes of solver stderr kept for diagnostics.
const STDERR_TAIL_BYTES: usize = 4096;

/// How long to wait for the stderr reader once the solver has exited.
/// Background processes the solver left behind may keep the pipe open.
const STDERR_DRAIN_GRACE: Duration = Duration::from_millis(250);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How to launch the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolverCommand {
    pub program: PathBuf,
    /// Arguments before the fixed flags (e.g. `-jar <path>`).
    pub prefix_args: Vec<String>,
    pub flags: Vec<String>,
}

impl Default for SolverCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            prefix_args: DEFAULT_PREFIX_ARGS.iter().map(|s| s.to_string()).collect(),
            flags: DEFAULT_FLAGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Per-invocation options.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Kill the solver after this long. No limit when `None`.
    pub timeout: Option<Duration>,
    /// Send stderr into the log file as well.
    pub merge_stderr: bool,
    /// Pipe stderr through to our own stderr and keep its tail in
    /// [`Invocation::stderr_tail`]. Ignored when `merge_stderr` is set.
    pub capture_stderr: bool,
}

/// Outcome of one solver run.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub timed_out: bool,
    pub duration: Duration,
    /// Last bytes of stderr. Empty unless stderr was captured.
    pub stderr_tail: String,
}

impl SolverCommand {
    /// Full argument vector: prefix args, flags, then the input path.
    pub fn argv(&self, input: &Path) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.prefix_args.len() + self.flags.len() + 1);
        argv.extend(self.prefix_args.iter().cloned());
        argv.extend(self.flags.iter().cloned());
        argv.push(input.to_string_lossy().into_owned());
        argv
    }

    /// Human-readable command line, for logs.
    pub fn display(&self, input: &Path) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.argv(input));
        parts.join(" ")
    }

    /// Run the solver on `input`, writing its stdout to `log`.
    ///
    /// Non-zero exit and timeouts are reported in the returned [`Invocation`];
    /// only failures to open the log or start the process are errors.
    pub fn invoke(
        &self,
        input: &Path,
        log: &Path,
        opts: &InvokeOptions,
    ) -> SweepResult<Invocation> {
        let log_file = File::create(log).map_err(|source| SweepError::OpenLog {
            path: log.to_path_buf(),
            source,
        })?;
        let stderr = if opts.merge_stderr {
            let dup = log_file.try_clone().map_err(|source| SweepError::OpenLog {
                path: log.to_path_buf(),
                source,
            })?;
            Stdio::from(dup)
        } else if opts.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::inherit()
        };

        tracing::debug!(command = %self.display(input), log = %log.display(), "launching solver");

        let start = Instant::now();
        let mut child = Command::new(&self.program)
            .args(self.argv(input))
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(stderr)
            .spawn()
            .map_err(|source| SweepError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        // Drain stderr on a side thread so a chatty solver cannot block on a
        // full pipe while we wait.
        let stderr_tee = child.stderr.take().map(StderrTee::spawn);

        let waited = match opts.timeout {
            Some(limit) => child.wait_timeout(limit),
            None => child.wait().map(Some),
        };

        let status = match waited {
            Ok(status) => status,
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SweepError::Wait { source });
            }
        };

        let timed_out = status.is_none();
        if timed_out {
            let _ = child.kill();
            let _ = child.wait(); // reap
        }

        let duration = start.elapsed();
        let stderr_tail = stderr_tee
            .map(|tee| tee.finish(STDERR_DRAIN_GRACE))
            .unwrap_or_default();

        Ok(Invocation {
            exit_code: status.and_then(|s| s.code()),
            success: status.map(|s| s.success()).unwrap_or(false),
            timed_out,
            duration,
            stderr_tail,
        })
    }
}

/// Copies a child's stderr to ours, keeping the last [`STDERR_TAIL_BYTES`].
struct StderrTee {
    tail: Arc<Mutex<VecDeque<u8>>>,
    reader: JoinHandle<()>,
}

impl StderrTee {
    fn spawn(mut pipe: ChildStderr) -> Self {
        let tail = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_BYTES)));
        let sink = Arc::clone(&tail);
        let reader = std::thread::spawn(move || {
            let mut chunk = [0u8; 1024];
            loop {
                let n = match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                };
                let _ = std::io::stderr().write_all(&chunk[..n]);
                if let Ok(mut tail) = sink.lock() {
                    push_bounded(&mut tail, &chunk[..n], STDERR_TAIL_BYTES);
                }
            }
        });
        Self { tail, reader }
    }

    /// Wait up to `grace` for the pipe to close, then return what was kept.
    /// A reader still blocked after that is left detached.
    fn finish(self, grace: Duration) -> String {
        let deadline = Instant::now() + grace;
        while !self.reader.is_finished() && Instant::now() < deadline {
            std::thread::sleep(POLL_INTERVAL);
        }
        if self.reader.is_finished() {
            let _ = self.reader.join();
        }
        let bytes: Vec<u8> = match self.tail.lock() {
            Ok(tail) => tail.iter().copied().collect(),
            Err(poisoned) => poisoned.into_inner().iter().copied().collect(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn push_bounded(buf: &mut VecDeque<u8>, bytes: &[u8], max: usize) {
    buf.extend(bytes);
    let excess = buf.len().saturating_sub(max);
    buf.drain(..excess);
}

trait ChildExt {
    /// `Ok(None)` if the child is still running after `limit`.
    fn wait_timeout(&mut self, limit: Duration) -> std::io::Result<Option<ExitStatus>>;
}

impl ChildExt for Child {
    fn wait_timeout(&mut self, limit: Duration) -> std::io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if let Some(status) = self.try_wait()? {
                return Ok(Some(status));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        self.try_wait()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_command_matches_forclift_layout() {
        let cmd = SolverCommand::default();
        assert_eq!(
            cmd.display(Path::new("/tmp/in.mln")),
            "java -jar target/scala-2.11/forclift.jar -z --format-in mln /tmp/in.mln"
        );
    }

    #[test]
    fn input_path_is_last_argument() {
        let cmd = SolverCommand {
            program: PathBuf::from("solver"),
            prefix_args: vec![],
            flags: DEFAULT_FLAGS.iter().map(|s| s.to_string()).collect(),
        };
        let argv = cmd.argv(Path::new("x.mln"));
        assert_eq!(argv, vec!["-z", "--format-in", "mln", "x.mln"]);
    }

    #[test]
    fn tail_buffer_is_bounded() {
        let mut buf = VecDeque::new();
        push_bounded(&mut buf, b"ab", 3);
        assert_eq!(buf, b"ab");
        push_bounded(&mut buf, b"cdef", 3);
        assert_eq!(buf, b"def");
        push_bounded(&mut buf, &[b'x'; 10_000], 3);
        assert_eq!(buf.len(), 3);
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;

        /// `sh -c <script> sh -z --format-in mln <input>` puts the input at `$4`.
        fn sh(script: &str) -> SolverCommand {
            SolverCommand {
                program: PathBuf::from("sh"),
                prefix_args: vec!["-c".into(), script.into(), "sh".into()],
                flags: DEFAULT_FLAGS.iter().map(|s| s.to_string()).collect(),
            }
        }

        #[test]
        fn stdout_goes_to_log() {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("in.mln");
            std::fs::write(&input, "friends(0,2).\n").unwrap();
            let log = dir.path().join("1.log");

            let inv = sh(r#"printf '%s %s %s\n' "$1" "$2" "$3"; cat "$4""#)
                .invoke(&input, &log, &InvokeOptions::default())
                .unwrap();

            assert!(inv.success);
            assert_eq!(inv.exit_code, Some(0));
            assert_eq!(
                std::fs::read_to_string(&log).unwrap(),
                "-z --format-in mln\nfriends(0,2).\n"
            );
        }

        #[test]
        fn log_is_overwritten() {
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("1.log");
            std::fs::write(&log, "stale content that is long\n").unwrap();
            sh("echo fresh")
                .invoke(&dir.path().join("in"), &log, &InvokeOptions::default())
                .unwrap();
            assert_eq!(std::fs::read_to_string(&log).unwrap(), "fresh\n");
        }

        fn capture() -> InvokeOptions {
            InvokeOptions {
                capture_stderr: true,
                ..Default::default()
            }
        }

        #[test]
        fn nonzero_exit_is_reported_not_raised() {
            let dir = tempfile::tempdir().unwrap();
            let inv = sh("echo boom >&2; exit 3")
                .invoke(&dir.path().join("in"), &dir.path().join("1.log"), &capture())
                .unwrap();
            assert!(!inv.success);
            assert_eq!(inv.exit_code, Some(3));
            assert_eq!(inv.stderr_tail, "boom\n");
        }

        #[test]
        fn stderr_is_inherited_by_default() {
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("1.log");
            let inv = sh("echo out; echo warn >&2")
                .invoke(&dir.path().join("in"), &log, &InvokeOptions::default())
                .unwrap();
            assert!(inv.success);
            assert!(inv.stderr_tail.is_empty());
            assert_eq!(std::fs::read_to_string(&log).unwrap(), "out\n");
        }

        #[test]
        fn captured_tail_is_kept_on_success() {
            let dir = tempfile::tempdir().unwrap();
            let inv = sh("echo warn >&2")
                .invoke(&dir.path().join("in"), &dir.path().join("1.log"), &capture())
                .unwrap();
            assert!(inv.success);
            assert_eq!(inv.stderr_tail, "warn\n");
        }

        #[test]
        fn captured_tail_is_bounded() {
            let dir = tempfile::tempdir().unwrap();
            let inv = sh("head -c 20000 /dev/zero | tr '\\0' x >&2; echo end >&2")
                .invoke(&dir.path().join("in"), &dir.path().join("1.log"), &capture())
                .unwrap();
            assert_eq!(inv.stderr_tail.len(), STDERR_TAIL_BYTES);
            assert!(inv.stderr_tail.ends_with("xend\n"));
        }

        #[test]
        fn background_process_holding_stderr_does_not_stall() {
            let dir = tempfile::tempdir().unwrap();
            let started = Instant::now();
            let inv = sh("echo early >&2; sleep 5 >/dev/null &")
                .invoke(&dir.path().join("in"), &dir.path().join("1.log"), &capture())
                .unwrap();
            assert!(started.elapsed() < Duration::from_secs(3));
            assert!(inv.success);
            assert_eq!(inv.stderr_tail, "early\n");
        }

        #[test]
        fn merged_stderr_lands_in_log() {
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("1.log");
            let opts = InvokeOptions {
                merge_stderr: true,
                ..Default::default()
            };
            let inv = sh("echo out; echo err >&2")
                .invoke(&dir.path().join("in"), &log, &opts)
                .unwrap();
            assert!(inv.stderr_tail.is_empty());
            assert_eq!(std::fs::read_to_string(&log).unwrap(), "out\nerr\n");
        }

        #[test]
        fn timeout_kills_solver() {
            let dir = tempfile::tempdir().unwrap();
            let opts = InvokeOptions {
                timeout: Some(Duration::from_millis(200)),
                ..Default::default()
            };
            let inv = sh("exec sleep 5")
                .invoke(&dir.path().join("in"), &dir.path().join("1.log"), &opts)
                .unwrap();
            assert!(inv.timed_out);
            assert!(!inv.success);
            assert!(inv.stderr_tail.is_empty());
            assert_eq!(inv.exit_code, None);
            assert!(inv.duration < Duration::from_secs(5));
        }

        #[test]
        fn missing_program_is_launch_error() {
            let dir = tempfile::tempdir().unwrap();
            let cmd = SolverCommand {
                program: dir.path().join("no-such-solver"),
                ..SolverCommand::default()
            };
            let err = cmd
                .invoke(
                    &dir.path().join("in"),
                    &dir.path().join("1.log"),
                    &InvokeOptions::default(),
                )
                .unwrap_err();
            assert!(matches!(err, SweepError::Launch { .. }), "{err}");
        }

        #[test]
        fn missing_log_dir_is_open_log_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = sh("true")
                .invoke(
                    &dir.path().join("in"),
                    &dir.path().join("logs/1.log"),
                    &InvokeOptions::default(),
                )
                .unwrap_err();
            assert!(matches!(err, SweepError::OpenLog { .. }), "{err}");
        }
    }
}
