//! External command execution with kill-on-timeout.
//!
//! Collaborator tools (git, devcontainer, docker) are blocking child
//! processes; an unresponsive one must not hang a lifecycle command, so
//! every invocation waits with a deadline and kills the child on expiry.

use std::env;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use wait_timeout::ChildExt;

/// Default deadline for a single collaborator invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {}: {source}", program.display())]
    Spawn { program: PathBuf, source: io::Error },

    #[error("{} timed out after {timeout:?}", program.display())]
    Timeout { program: PathBuf, timeout: Duration },

    #[error("failed to wait for {}: {source}", program.display())]
    Wait { program: PathBuf, source: io::Error },
}

/// One external command invocation.
#[derive(Debug, Default)]
pub struct ExecRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Per-request deadline; falls back to the service default.
    pub timeout: Option<Duration>,
}

impl ExecRequest {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Captured result of a finished command.
#[derive(Debug)]
pub struct ExecOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// First non-empty stderr line, for compact error reporting.
    pub fn error_line(&self) -> String {
        self.stderr
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}", self.status))
    }
}

/// Structured command execution with timeouts.
#[derive(Debug, Clone)]
pub struct ExecService {
    default_timeout: Duration,
}

impl ExecService {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// Deadline from `BRANCHBOX_EXEC_TIMEOUT_SECS`, falling back on the default.
    pub fn from_env() -> Self {
        let timeout = env::var("BRANCHBOX_EXEC_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self::new(timeout)
    }

    pub fn run(&self, request: ExecRequest) -> Result<ExecOutput, ExecError> {
        let mut cmd = Command::new(&request.program);
        cmd.args(&request.args);
        if let Some(ref cwd) = request.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: request.program.clone(),
            source,
        })?;
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let status = match child.wait_timeout(timeout).map_err(|source| ExecError::Wait {
            program: request.program.clone(),
            source,
        })? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecError::Timeout {
                    program: request.program,
                    timeout,
                });
            }
        };

        let stdout = read_stream(stdout_pipe.as_mut());
        let stderr = read_stream(stderr_pipe.as_mut());
        Ok(ExecOutput {
            status,
            stdout,
            stderr,
        })
    }
}

impl Default for ExecService {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn read_stream<R: Read>(pipe: Option<&mut R>) -> String {
    let mut buf = String::new();
    if let Some(r) = pipe {
        let _ = r.read_to_string(&mut buf);
    }
    buf
}
