//! Step execution.

use crate::step::{OutputMode, StepConfig};
use devctl_core::{DevError, Result};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Result of a step execution.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name.
    pub step_name: String,

    /// Exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,

    /// Captured stdout (empty when output is inherited).
    pub stdout: String,

    /// Captured stderr (empty when output is inherited).
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether execution succeeded.
    pub success: bool,
}

impl StepResult {
    /// Whether this step passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }

    /// Short failure description for logs and error chains.
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("{} exited with code {}", self.step_name, self.exit_code)
        } else {
            format!(
                "{} exited with code {}: {}",
                self.step_name, self.exit_code, stderr
            )
        }
    }
}

/// Runs a step as a child process with an explicit argument list.
pub struct StepRunner;

impl StepRunner {
    /// Execute a single step and return the result.
    ///
    /// A non-zero exit is reported through [`StepResult`], not as an error.
    /// Errors are reserved for steps that could not run to completion.
    pub async fn execute(config: &StepConfig) -> Result<StepResult> {
        let start = Instant::now();

        let (exe, args) = config
            .command
            .split_first()
            .ok_or_else(|| DevError::EmptyCommand(config.name.clone()))?;

        debug!(step = %config.name, command = %config.display_command(), "Spawning step");

        let mut command = Command::new(exe);
        command
            .args(args)
            .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match config.output {
            OutputMode::Capture => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputMode::Inherit => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
        }

        let child = command.spawn().map_err(|source| DevError::Spawn {
            program: exe.clone(),
            source,
        })?;

        let output = if config.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| DevError::StepTimedOut {
                step: config.name.clone(),
                timeout_secs: config.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!(step = %config.name, exit_code, duration_ms, "Step finished");

        Ok(StepResult {
            step_name: config.name.clone(),
            exit_code,
            stdout,
            stderr,
            duration_ms,
            success: output.status.success(),
        })
    }
}
