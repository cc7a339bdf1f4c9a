//! Running installed executables.
//!
//! Post-install and uninstall executables go through [`CommandExecutor`] so
//! tests can substitute a stub. The system implementation kills commands that
//! outlive [`EXECUTABLE_TIMEOUT`].

use std::io;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Longest an executable may run before it is killed.
pub const EXECUTABLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs `cmd` with `args` and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while spawning or waiting for the
    /// command, or [`io::ErrorKind::TimedOut`] when it runs too long.
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> io::Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy)]
pub struct SystemCommandExecutor {
    timeout: Duration,
}

impl SystemCommandExecutor {
    /// Executor that kills commands after `timeout`.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::with_timeout(EXECUTABLE_TIMEOUT)
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let stdout = child
                    .stdout
                    .take()
                    .map(io::read_to_string)
                    .transpose()?
                    .unwrap_or_default();
                let stderr = child
                    .stderr
                    .take()
                    .map(io::read_to_string)
                    .transpose()?
                    .unwrap_or_default();
                Ok(Output {
                    status,
                    stdout: stdout.into_bytes(),
                    stderr: stderr.into_bytes(),
                })
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{cmd} timed out after {} seconds", self.timeout.as_secs()),
                ))
            }
        }
    }
}

/// Describes a failed run for messages: the exit status plus any stderr.
#[must_use]
pub fn describe_failure(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        format!("{}: {stderr}", output.status)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_output_of_finished_commands() {
        let output = SystemCommandExecutor::default()
            .run("sh", &["-c", "echo out; echo err >&2; exit 3"])
            .expect("sh runs");
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(describe_failure(&output), "exit status: 3: err");
    }

    #[test]
    fn kills_commands_that_overrun() {
        let executor = SystemCommandExecutor::with_timeout(Duration::from_millis(100));
        let err = executor.run("sleep", &["5"]).expect_err("timeout");
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
