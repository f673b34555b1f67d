//! Run configuration and environment settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which slice of the test suite to run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    /// Only tests carrying the unit build tag; no services are started.
    UnitOnly,
    /// Every test, with the services environment up for the whole run.
    Full,
}

impl TestMode {
    pub fn from_unit_only(unit_only: bool) -> Self {
        if unit_only {
            TestMode::UnitOnly
        } else {
            TestMode::Full
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TestMode::UnitOnly => "unit_only",
            TestMode::Full => "full",
        }
    }
}

/// Immutable description of one test invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: TestMode,

    /// Passed through to the test command verbatim, in order.
    pub extra_args: Vec<String>,
}

impl RunConfig {
    pub fn new(mode: TestMode, extra_args: Vec<String>) -> Self {
        Self { mode, extra_args }
    }
}

/// Settings for the services environment and the commands run against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// Container-compose program.
    pub compose_bin: String,

    /// Environment descriptor handed to every compose call.
    pub compose_file: PathBuf,

    /// Compose service hosting the database.
    pub db_service: String,

    /// Readiness probe executed inside the database service.
    pub probe_command: Vec<String>,

    /// Delay between two readiness probes (milliseconds).
    pub poll_interval_ms: u64,

    /// Overall readiness deadline (milliseconds).
    pub startup_timeout_ms: u64,

    /// Shutdown timeout handed to `down --timeout` (seconds).
    pub teardown_timeout_secs: u64,

    /// Test-execution program.
    pub test_bin: String,

    /// Package pattern passed to the test program.
    pub test_packages: String,

    /// Build tag selecting unit tests.
    pub unit_tag: String,

    /// Environment variable set for the duration of the test command.
    pub log_level_var: (String, String),
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            compose_bin: "docker-compose".to_string(),
            compose_file: PathBuf::from("docker-compose.yaml"),
            db_service: "database".to_string(),
            probe_command: vec!["pg_isready".to_string()],
            poll_interval_ms: 300,
            startup_timeout_ms: 5_000,
            teardown_timeout_secs: 1,
            test_bin: "gotest".to_string(),
            test_packages: "./...".to_string(),
            unit_tag: "unit".to_string(),
            log_level_var: ("LOG_LEVEL".to_string(), "DEBUG".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(TestMode::from_unit_only(true), TestMode::UnitOnly);
        assert_eq!(TestMode::from_unit_only(false), TestMode::Full);
        assert_eq!(TestMode::Full.name(), "full");
    }

    #[test]
    fn test_default_timings() {
        let settings = EnvironmentSettings::default();
        assert_eq!(settings.poll_interval_ms, 300);
        assert_eq!(settings.startup_timeout_ms, 5_000);
        assert_eq!(settings.teardown_timeout_secs, 1);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: EnvironmentSettings =
            serde_json::from_str(r#"{ "db_service": "postgres", "poll_interval_ms": 100 }"#)
                .unwrap();
        assert_eq!(settings.db_service, "postgres");
        assert_eq!(settings.poll_interval_ms, 100);
        assert_eq!(settings.compose_bin, "docker-compose");
        assert_eq!(settings.startup_timeout_ms, 5_000);
    }
}
