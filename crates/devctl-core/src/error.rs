//! Error types for devctl

use thiserror::Error;

/// Errors that can occur while orchestrating a developer workflow
#[derive(Error, Debug)]
pub enum DevError {
    /// The readiness probe never succeeded before the deadline
    #[error(
        "database did not start: no successful readiness probe after {attempts} attempt(s) \
         in {elapsed_ms}ms (last error: {last_error})"
    )]
    StartupTimeout {
        attempts: u32,
        elapsed_ms: u64,
        last_error: String,
    },

    /// The services environment could not be brought up
    #[error("could not start services: {0}")]
    ServicesStart(String),

    /// The test command reported a non-zero status
    #[error("tests failed with status {status}")]
    TestFailure { status: i32 },

    /// Tearing down the services environment failed
    #[error("could not tear down services: {0}")]
    TeardownFailed(String),

    /// A step was configured without a program to run
    #[error("step {0} has an empty command")]
    EmptyCommand(String),

    /// A step exceeded its wall-clock limit and was killed
    #[error("step {step} timed out after {timeout_secs} seconds")]
    StepTimedOut { step: String, timeout_secs: u64 },

    /// The program could not be spawned at all
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tools manifest could not be read or parsed
    #[error("invalid tools manifest: {0}")]
    Manifest(String),

    /// Installing a declared tool failed
    #[error("installing {tool} failed with status {status}")]
    ToolInstall { tool: String, status: i32 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for devctl operations
pub type Result<T> = std::result::Result<T, DevError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_timeout_mentions_database() {
        let err = DevError::StartupTimeout {
            attempts: 17,
            elapsed_ms: 5100,
            last_error: "no response".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("database did not start"));
        assert!(msg.contains("17 attempt(s)"));
        assert!(msg.contains("no response"));
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        let err = DevError::Spawn {
            program: "gotest".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("gotest"));
    }
}
