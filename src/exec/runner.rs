//! External command execution
//!
//! Commands are structured program + argument lists, never shell strings.
//! The [`CommandRunner`] trait is the seam benchmarks are written against;
//! [`SystemRunner`] runs the real processes.

use crate::{LustreBenchError, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, Instrument, Span};

/// A program invocation with its arguments and optional stdin payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
    stdin: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed this text to the process on stdin
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// Program and arguments as lossy strings, for assertions and logs
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    /// Value of a `dd`-style `key=value` operand
    pub fn operand(&self, key: &str) -> Option<String> {
        let prefix = format!("{}=", key);
        self.args.iter().find_map(|a| {
            a.to_string_lossy()
                .strip_prefix(&prefix)
                .map(|v| v.to_string())
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))
    }
}

/// Executes commands and returns their stdout
///
/// Implementations must fail with [`LustreBenchError::CommandExecution`]
/// when the command exits nonzero, carrying the captured stderr. No retries.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, command: &CommandSpec) -> Result<String>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    async fn run(&self, command: &CommandSpec) -> Result<String> {
        (**self).run(command).await
    }
}

/// Runs commands as child processes of this one
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Option<Duration>,
    span: Span,
}

impl SystemRunner {
    pub fn new(span: Span) -> Self {
        Self {
            timeout: None,
            span,
        }
    }

    /// Kill and fail commands that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn execute(&self, command: &CommandSpec) -> Result<String> {
        let rendered = command.to_string();
        debug!(command = %rendered, "running command");

        let mut child = Command::new(command.program())
            .args(command.get_args())
            .stdin(if command.stdin().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(command = %rendered, error = %e, "failed to spawn command");
                LustreBenchError::CommandExecution {
                    command: rendered.clone(),
                    exit_code: None,
                    stderr: e.to_string(),
                }
            })?;

        if let (Some(input), Some(mut stdin)) = (command.stdin(), child.stdin.take()) {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(output) => output?,
                Err(_) => {
                    error!(command = %rendered, timeout = %humantime::format_duration(limit), "command timed out");
                    return Err(LustreBenchError::CommandTimeout {
                        command: rendered,
                        timeout: limit,
                    });
                }
            },
            None => wait.await?,
        };

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            error!(
                command = %rendered,
                exit_code = ?output.status.code(),
                stderr = %stderr.trim(),
                "command failed"
            );
            return Err(LustreBenchError::CommandExecution {
                command: rendered,
                exit_code: output.status.code(),
                stderr,
            });
        }

        if !stderr.trim().is_empty() {
            debug!(command = %rendered, stderr = %stderr.trim(), "command stderr");
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandSpec) -> Result<String> {
        self.execute(command).instrument(self.span.clone()).await
    }
}
