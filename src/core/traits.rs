//! Core traits and types for running external commands
//!
//! The sync workflow never spawns processes directly; it talks to a
//! [`CommandRunner`] so the git plumbing can be exercised without a network.

use crate::security::command_executor::CommandError;
use async_trait::async_trait;
use std::path::Path;

// ============================================================================
// Execution Options
// ============================================================================

/// Where the child's stdout/stderr go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    /// Capture output into the returned [`CommandOutput`]
    #[default]
    Capture,
    /// Stream output live to the parent's terminal
    Inherit,
}

/// Options for a single command invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOptions {
    pub stdio: StdioMode,
    /// Echo the command line before running it
    pub print_command: bool,
}

impl ExecOptions {
    /// Captured output, no echo. Used for anything that may carry credentials.
    pub fn quiet() -> Self {
        Self::default()
    }

    /// Streamed output with the command echoed first
    pub fn loud() -> Self {
        Self {
            stdio: StdioMode::Inherit,
            print_command: true,
        }
    }
}

// ============================================================================
// Command Output
// ============================================================================

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    /// Captured stdout (trimmed); empty when output was inherited
    pub stdout: String,
    /// Captured stderr (trimmed); empty when output was inherited
    pub stderr: String,
}

impl CommandOutput {
    /// Create a CommandOutput from raw process output
    pub fn from_output(output: &std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

// ============================================================================
// Command Runner Trait
// ============================================================================

/// Executes external commands on behalf of the sync workflow
///
/// Implementations must return `Err(CommandError::NonZeroExit { .. })` for a
/// non-zero exit and keep the full argument list out of the error's message.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `cwd`
    async fn run(
        &self,
        cwd: &Path,
        program: &str,
        args: &[String],
        options: ExecOptions,
    ) -> Result<CommandOutput, CommandError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_options_capture_without_echo() {
        let options = ExecOptions::quiet();
        assert_eq!(options.stdio, StdioMode::Capture);
        assert!(!options.print_command);
    }

    #[test]
    fn test_loud_options_inherit_with_echo() {
        let options = ExecOptions::loud();
        assert_eq!(options.stdio, StdioMode::Inherit);
        assert!(options.print_command);
    }

    #[test]
    fn test_command_output_success() {
        let ok = CommandOutput {
            code: Some(0),
            ..Default::default()
        };
        let failed = CommandOutput {
            code: Some(1),
            ..Default::default()
        };
        let killed = CommandOutput::default();

        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }
}
