//! SafeCommandExecutor: whitelisted, argument-vector command execution
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved commands can execute
//! - **Injection prevention**: Uses `tokio::process::Command`, never a shell
//! - **Argument confidentiality**: Errors name the program and subcommand only,
//!   so URLs carrying credentials cannot leak through an error message
//! - **Working directory validation**: Validates existence before execution
//! - **Optional timeout**: Bounds long-running or hanging processes
//!
//! # Example
//!
//! ```rust,no_run
//! use wiki_pages_sync::{CommandRunner, ExecOptions, SafeCommandExecutor};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let executor = SafeCommandExecutor::new();
//! let args = vec!["--version".to_string()];
//! let output = executor
//!     .run(Path::new("."), "git", &args, ExecOptions::quiet())
//!     .await?;
//! println!("{}", output.stdout);
//! # Ok(())
//! # }
//! ```

use crate::core::traits::{CommandOutput, CommandRunner, ExecOptions, StdioMode};
use async_trait::async_trait;
use console::style;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist.
///
/// The sync workflow only ever needs git.
const ALLOWED_COMMANDS: &[&str] = &["git"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be started (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),

    /// Command ran and exited unsuccessfully
    #[error("Command failed: {command} (exit code {code})")]
    NonZeroExit {
        /// Program and subcommand only, e.g. `git clone`
        command: String,
        code: i32,
        result: CommandOutput,
    },
}

impl CommandError {
    /// Captured output of a command that ran and failed
    pub fn result(&self) -> Option<&CommandOutput> {
        match self {
            Self::NonZeroExit { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Short label for a command line that never includes positional arguments
pub fn command_label(program: &str, args: &[String]) -> String {
    match args.first() {
        Some(sub) => format!("{} {}", program, sub),
        None => program.to_string(),
    }
}

/// Safe command executor with security controls
#[derive(Debug, Default)]
pub struct SafeCommandExecutor {
    /// Optional timeout for command execution
    timeout: Option<Duration>,
}

impl SafeCommandExecutor {
    /// Create a new executor without a timeout
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Set command execution timeout.
    ///
    /// Commands exceeding this duration are killed.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn validate(&self, cwd: &Path, program: &str) -> Result<(), CommandError> {
        if !ALLOWED_COMMANDS.contains(&program) {
            return Err(CommandError::CommandNotAllowed(program.to_string()));
        }

        if !cwd.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(cwd.to_path_buf()));
        }

        Ok(())
    }

    async fn spawn(
        &self,
        cwd: &Path,
        program: &str,
        args: &[String],
        stdio: StdioMode,
    ) -> Result<CommandOutput, CommandError> {
        let mut command = Command::new(program);
        command.args(args).current_dir(cwd).kill_on_drop(true);

        match stdio {
            StdioMode::Capture => {
                let output = command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
                Ok(CommandOutput::from_output(&output))
            }
            StdioMode::Inherit => {
                let status = command
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
                Ok(CommandOutput {
                    code: status.code(),
                    ..Default::default()
                })
            }
        }
    }
}

#[async_trait]
impl CommandRunner for SafeCommandExecutor {
    async fn run(
        &self,
        cwd: &Path,
        program: &str,
        args: &[String],
        options: ExecOptions,
    ) -> Result<CommandOutput, CommandError> {
        self.validate(cwd, program)?;

        if options.print_command {
            println!("{} {} {}", style("$").dim(), program, args.join(" "));
        }

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.spawn(cwd, program, args, options.stdio))
                .await
                .map_err(|_| CommandError::Timeout(limit))??,
            None => self.spawn(cwd, program, args, options.stdio).await?,
        };

        if output.success() {
            Ok(output)
        } else {
            Err(CommandError::NonZeroExit {
                command: command_label(program, args),
                code: output.code.unwrap_or(-1),
                result: output,
            })
        }
    }
}
