//! Process invocation for every external query.
//!
//! Commands are structured argument vectors handed straight to
//! [`std::process::Command`]; nothing is ever interpolated into a shell
//! string. [`Invocation::display`] quotes arguments for logs only.

use std::process::Command;

use serde::Serialize;

use crate::error::{CommandFailedDetails, Error, Result};
use crate::shell;

/// A program plus its argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
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

    /// Shell-quoted rendering, for logs and error details.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            return shell::quote_arg(&self.program);
        }
        format!(
            "{} {}",
            shell::quote_arg(&self.program),
            shell::quote_args(&self.args)
        )
    }
}

/// Captured result of one external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

/// Why a command is considered failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub code: i32,
    pub message: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
            exit_code: 0,
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
            exit_code,
        }
    }

    /// Prefers stderr, falls back to stdout if stderr is empty.
    pub fn error_text(&self) -> String {
        if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else {
            self.stdout.trim().to_string()
        }
    }

    /// Tagged view of the exit status: stdout on success, code and message otherwise.
    pub fn status(&self) -> std::result::Result<&str, CommandFailure> {
        if self.success {
            Ok(&self.stdout)
        } else {
            Err(CommandFailure {
                code: self.exit_code,
                message: self.error_text(),
            })
        }
    }

    /// Like [`status`](Self::status) but also treats any stderr output as failure.
    pub fn strict_status(&self) -> std::result::Result<&str, CommandFailure> {
        let stdout = self.status()?;
        if !self.stderr.trim().is_empty() {
            return Err(CommandFailure {
                code: self.exit_code,
                message: self.stderr.trim().to_string(),
            });
        }
        Ok(stdout)
    }

    pub fn failure_details(&self, invocation: &Invocation, group: Option<&str>) -> CommandFailedDetails {
        CommandFailedDetails {
            command: invocation.display(),
            exit_code: self.exit_code,
            stdout: self.stdout.trim().to_string(),
            stderr: self.stderr.trim().to_string(),
            group: group.map(str::to_string),
        }
    }
}

/// Seam between the workflow and the external system.
///
/// `Err` means the command could not be run at all; a command that ran and
/// failed is an `Ok` output with `success == false`.
pub trait Transport {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs invocations as local child processes, blocking until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTransport;

impl Transport for ProcessTransport {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::debug!(command = %invocation.display(), "running");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|e| {
                Error::internal_io(
                    format!("Failed to run {}: {}", invocation.program, e),
                    Some(invocation.display()),
                )
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}
