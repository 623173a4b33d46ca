//! System module: external tool execution behind the `ToolRunner` seam

pub mod recording;
pub mod tools;

use crate::error::ToolError;
use futures::future::BoxFuture;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

pub use recording::RecordingRunner;
pub use tools::missing_tools;

/// Log a stage milestone: echoed to the operator and written to the parsed log.
#[macro_export]
macro_rules! log_parsed {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        $crate::log::info!(target: "parsed", "{}", msg);
    }}
}

/// How a tool's stdout/stderr is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect both streams; the caller parses them
    Capture,
    /// Relay lines to the operator as they arrive (progress output)
    Stream,
}

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub mode: OutputMode,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, mode: OutputMode) -> Self {
        ToolCommand {
            program: program.into(),
            args: Vec::new(),
            mode,
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

    /// First argument, the subcommand for diskutil/hdiutil/wimlib-imagex.
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a successful (exit code 0) invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        ToolOutput {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// stdout followed by stderr, the way a combined-output capture reads.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() || self.stdout.ends_with('\n') {
            format!("{}{}", self.stdout, self.stderr)
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Trait for external tool execution
///
/// The pipeline talks to diskutil, hdiutil, df, rsync and wimlib only through
/// this seam. A non-zero exit must come back as `ToolError::NonZeroExit`.
pub trait ToolRunner: Send + Sync {
    fn run(&self, command: ToolCommand) -> BoxFuture<'static, Result<ToolOutput, ToolError>>;
}

/// Default production implementation of ToolRunner on tokio::process.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        SystemRunner { timeout }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, command: ToolCommand) -> BoxFuture<'static, Result<ToolOutput, ToolError>> {
        let timeout = self.timeout;
        Box::pin(async move {
            log::debug!("[System] [EXEC] {}", command.display());
            let program = command.program.clone();
            let fut = execute(command);
            match timeout {
                Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                    log::warn!("[System] [TIMEOUT] '{}' exceeded {}s", program, limit.as_secs());
                    ToolError::TimedOut {
                        program,
                        secs: limit.as_secs(),
                    }
                })?,
                None => fut.await,
            }
        })
    }
}

async fn execute(command: ToolCommand) -> Result<ToolOutput, ToolError> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    // A timed-out future is dropped; take the child with it
    cmd.kill_on_drop(true);

    match command.mode {
        OutputMode::Capture => {
            let output = cmd.output().await.map_err(|e| ToolError::Spawn {
                program: command.program.clone(),
                reason: e.to_string(),
            })?;
            let captured = ToolOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            if output.status.success() {
                Ok(captured)
            } else {
                Err(ToolError::NonZeroExit {
                    program: command.program,
                    code: output.status.code(),
                    output: captured.combined(),
                })
            }
        }
        OutputMode::Stream => stream(cmd, command.program).await,
    }
}

/// Relay stdout/stderr line by line to the terminal and the log.
async fn stream(mut cmd: Command, program: String) -> Result<ToolOutput, ToolError> {
    let mut child = cmd.spawn().map_err(|e| ToolError::Spawn {
        program: program.clone(),
        reason: e.to_string(),
    })?;

    let io_err = |reason: String| ToolError::Io {
        program: program.clone(),
        reason,
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io_err("Failed to capture stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io_err("Failed to capture stderr".to_string()))?;

    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();
    let mut stdout_closed = false;
    let mut stderr_closed = false;
    let mut captured = ToolOutput::default();

    while !(stdout_closed && stderr_closed) {
        tokio::select! {
            line = stdout_lines.next_line(), if !stdout_closed => match line {
                Ok(Some(line)) => {
                    println!("{}", line);
                    log::debug!(target: "tool", "[{}] {}", program, line);
                    captured.stdout.push_str(&line);
                    captured.stdout.push('\n');
                }
                Ok(None) => stdout_closed = true,
                Err(e) => {
                    log::warn!("[System] stdout read error from '{}': {}", program, e);
                    stdout_closed = true;
                }
            },
            line = stderr_lines.next_line(), if !stderr_closed => match line {
                Ok(Some(line)) => {
                    eprintln!("{}", line);
                    log::debug!(target: "tool", "[{}] [STDERR] {}", program, line);
                    captured.stderr.push_str(&line);
                    captured.stderr.push('\n');
                }
                Ok(None) => stderr_closed = true,
                Err(e) => {
                    log::warn!("[System] stderr read error from '{}': {}", program, e);
                    stderr_closed = true;
                }
            },
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| io_err(format!("Failed to wait for process: {}", e)))?;

    if status.success() {
        Ok(captured)
    } else {
        Err(ToolError::NonZeroExit {
            program,
            code: status.code(),
            // Streamed output already reached the operator
            output: String::new(),
        })
    }
}
