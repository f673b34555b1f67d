//! Step definitions: typed subprocess invocations.

use devctl_core::{EnvironmentSettings, TestMode};
use serde::{Deserialize, Serialize};

/// Extra seconds granted to `down` on top of the compose-level shutdown timeout.
const TEARDOWN_GRACE_SECS: u64 = 30;

/// Where a step's stdout/stderr go.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Collect output into the step result.
    Capture,
    /// Stream straight to the terminal.
    Inherit,
}

/// Configuration for a single step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepConfig {
    /// Human-readable step name.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Environment variables added on top of the inherited environment.
    pub env: Vec<(String, String)>,

    /// Timeout in seconds (0 = unbounded).
    pub timeout_secs: u64,

    pub output: OutputMode,
}

impl StepConfig {
    /// Create a custom step that captures its output.
    pub fn custom(name: String, command: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            name,
            command,
            env: Vec::new(),
            timeout_secs,
            output: OutputMode::Capture,
        }
    }

    /// Stream output to the terminal instead of capturing it.
    pub fn inherit_output(mut self) -> Self {
        self.output = OutputMode::Inherit;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Command line rendered for logs only; never handed to a shell.
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }

    /// `<compose> --file <file> up --detach`
    pub fn compose_up(settings: &EnvironmentSettings) -> Self {
        let mut command = compose_base(settings);
        command.extend(["up".to_string(), "--detach".to_string()]);
        Self::custom("compose_up".to_string(), command, 0)
    }

    /// `<compose> --file <file> exec -T <service> <probe...>`
    ///
    /// Bounded by the startup deadline so a hung probe cannot stall polling forever.
    pub fn compose_probe(settings: &EnvironmentSettings) -> Self {
        let mut command = compose_base(settings);
        command.extend([
            "exec".to_string(),
            "-T".to_string(),
            settings.db_service.clone(),
        ]);
        command.extend(settings.probe_command.iter().cloned());
        let timeout_secs = settings.startup_timeout_ms.div_ceil(1000).max(1);
        Self::custom("readiness_probe".to_string(), command, timeout_secs)
    }

    /// `<compose> --file <file> down --timeout <n>`
    pub fn compose_down(settings: &EnvironmentSettings) -> Self {
        let mut command = compose_base(settings);
        command.extend([
            "down".to_string(),
            "--timeout".to_string(),
            settings.teardown_timeout_secs.to_string(),
        ]);
        Self::custom(
            "compose_down".to_string(),
            command,
            settings.teardown_timeout_secs + TEARDOWN_GRACE_SECS,
        )
    }

    /// Test command, tag-filtered in unit-only mode, with extra args appended.
    pub fn go_test(settings: &EnvironmentSettings, mode: TestMode, extra_args: &[String]) -> Self {
        let mut command = vec![settings.test_bin.clone()];
        if mode == TestMode::UnitOnly {
            command.extend(["-tags".to_string(), settings.unit_tag.clone()]);
        }
        command.push(settings.test_packages.clone());
        command.extend(extra_args.iter().cloned());

        let (key, value) = &settings.log_level_var;
        Self::custom(format!("test_{}", mode.name()), command, 0)
            .with_env(key.clone(), value.clone())
            .inherit_output()
    }

    /// `<go> install <import path>`
    pub fn go_install(go_bin: &str, import_path: &str) -> Self {
        Self::custom(
            format!("install {}", import_path),
            vec![
                go_bin.to_string(),
                "install".to_string(),
                import_path.to_string(),
            ],
            0,
        )
        .inherit_output()
    }

    /// `<go> build`
    pub fn go_build(go_bin: &str) -> Self {
        Self::custom(
            "build".to_string(),
            vec![go_bin.to_string(), "build".to_string()],
            0,
        )
        .inherit_output()
    }
}

fn compose_base(settings: &EnvironmentSettings) -> Vec<String> {
    vec![
        settings.compose_bin.clone(),
        "--file".to_string(),
        settings.compose_file.to_string_lossy().into_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compose_commands() {
        let settings = EnvironmentSettings::default();

        assert_eq!(
            StepConfig::compose_up(&settings).command,
            strings(&["docker-compose", "--file", "docker-compose.yaml", "up", "--detach"])
        );
        assert_eq!(
            StepConfig::compose_probe(&settings).command,
            strings(&[
                "docker-compose",
                "--file",
                "docker-compose.yaml",
                "exec",
                "-T",
                "database",
                "pg_isready"
            ])
        );

        let down = StepConfig::compose_down(&settings);
        assert_eq!(
            down.command,
            strings(&["docker-compose", "--file", "docker-compose.yaml", "down", "--timeout", "1"])
        );
        assert!(down.timeout_secs > 0);
    }

    #[test]
    fn test_probe_timeout_follows_startup_deadline() {
        let mut settings = EnvironmentSettings::default();
        assert_eq!(StepConfig::compose_probe(&settings).timeout_secs, 5);

        settings.startup_timeout_ms = 200;
        assert_eq!(StepConfig::compose_probe(&settings).timeout_secs, 1);
    }

    #[test]
    fn test_unit_only_test_step_is_tag_filtered() {
        let settings = EnvironmentSettings::default();
        let extra = strings(&["-run", "TestMigrate"]);

        let step = StepConfig::go_test(&settings, TestMode::UnitOnly, &extra);
        assert_eq!(
            step.command,
            strings(&["gotest", "-tags", "unit", "./...", "-run", "TestMigrate"])
        );
        assert_eq!(step.output, OutputMode::Inherit);
        assert_eq!(step.env, vec![("LOG_LEVEL".to_string(), "DEBUG".to_string())]);
    }

    #[test]
    fn test_full_test_step_has_no_tag_filter() {
        let settings = EnvironmentSettings::default();
        let step = StepConfig::go_test(&settings, TestMode::Full, &[]);
        assert_eq!(step.command, strings(&["gotest", "./..."]));
        assert_eq!(step.timeout_secs, 0);
    }

    #[test]
    fn test_extra_args_are_passed_verbatim() {
        let settings = EnvironmentSettings::default();
        let extra = strings(&["-run", "Test With Spaces", "--", "$HOME"]);
        let step = StepConfig::go_test(&settings, TestMode::Full, &extra);
        assert_eq!(&step.command[2..], extra.as_slice());
    }

    #[test]
    fn test_go_install_and_build() {
        let install = StepConfig::go_install("go", "golang.org/x/tools/cmd/stringer");
        assert_eq!(
            install.command,
            strings(&["go", "install", "golang.org/x/tools/cmd/stringer"])
        );
        assert_eq!(StepConfig::go_build("go").command, strings(&["go", "build"]));
    }
}
