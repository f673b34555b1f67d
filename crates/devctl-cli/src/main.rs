//! devctl - helper CLI for a Go project's development environment
//!
//! ## Commands
//!
//! - `test`: run the test suite, with a transient database unless `--unit-only`
//! - `install-tools`: `go install` every tool declared in `tools.go`
//! - `build`: build the project

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, Level};

use devctl_ci::{
    build_project, install_tools, normalize_status, ComposeEnvironment, GoTestExecutor,
    PollPolicy, TestOrchestrator, CANONICAL_FAILURE_CODE, DEFAULT_MANIFEST,
};
use devctl_core::{DevError, EnvironmentSettings, RunConfig, TestMode};

#[derive(Parser, Debug)]
#[command(name = "devctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Helper CLI for the development environment", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the test suite
    ///
    /// Without --unit-only the database service is started first, polled
    /// until ready, and torn down once the tests finish.
    Test {
        /// Only run tests tagged as unit tests (no services are started)
        #[arg(short, long)]
        unit_only: bool,

        #[command(flatten)]
        environment: EnvironmentArgs,

        /// Extra arguments passed verbatim to the test command
        #[arg(last = true)]
        extra_args: Vec<String>,
    },

    /// Install the Go tools declared in the tools manifest
    #[command(alias = "install_tools")]
    InstallTools {
        /// Path to the tools manifest
        #[arg(short, long, default_value = DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Go toolchain binary
        #[arg(long, env = "DEVCTL_GO_BIN", default_value = "go")]
        go_bin: String,
    },

    /// Build the project
    Build {
        /// Go toolchain binary
        #[arg(long, env = "DEVCTL_GO_BIN", default_value = "go")]
        go_bin: String,
    },
}

/// Overrides for [`EnvironmentSettings`]; unset values keep the defaults.
#[derive(Args, Debug, Default)]
struct EnvironmentArgs {
    /// Container-compose program
    #[arg(long, env = "DEVCTL_COMPOSE_BIN")]
    compose_bin: Option<String>,

    /// Compose file describing the services
    #[arg(long, env = "DEVCTL_COMPOSE_FILE")]
    compose_file: Option<PathBuf>,

    /// Compose service running the database
    #[arg(long, env = "DEVCTL_DB_SERVICE")]
    db_service: Option<String>,

    /// Readiness probe run inside the database service (whitespace-separated)
    #[arg(long, env = "DEVCTL_PROBE")]
    probe: Option<String>,

    /// Delay between readiness probes, in milliseconds
    #[arg(long, env = "DEVCTL_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// How long to wait for the database, in milliseconds
    #[arg(long, env = "DEVCTL_STARTUP_TIMEOUT_MS")]
    startup_timeout_ms: Option<u64>,

    /// Shutdown timeout passed to `down`, in seconds
    #[arg(long, env = "DEVCTL_TEARDOWN_TIMEOUT_SECS")]
    teardown_timeout_secs: Option<u64>,

    /// Test-execution program
    #[arg(long, env = "DEVCTL_TEST_BIN")]
    test_bin: Option<String>,
}

impl EnvironmentArgs {
    fn into_settings(self) -> EnvironmentSettings {
        let mut settings = EnvironmentSettings::default();
        if let Some(compose_bin) = self.compose_bin {
            settings.compose_bin = compose_bin;
        }
        if let Some(compose_file) = self.compose_file {
            settings.compose_file = compose_file;
        }
        if let Some(db_service) = self.db_service {
            settings.db_service = db_service;
        }
        if let Some(probe) = self.probe {
            let command: Vec<String> = probe.split_whitespace().map(str::to_string).collect();
            if !command.is_empty() {
                settings.probe_command = command;
            }
        }
        if let Some(ms) = self.poll_interval_ms {
            settings.poll_interval_ms = ms;
        }
        if let Some(ms) = self.startup_timeout_ms {
            settings.startup_timeout_ms = ms;
        }
        if let Some(secs) = self.teardown_timeout_secs {
            settings.teardown_timeout_secs = secs;
        }
        if let Some(test_bin) = self.test_bin {
            settings.test_bin = test_bin;
        }
        settings
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    devctl_core::init_tracing(cli.json, level);

    match run(cli.command).await {
        Ok(code) => to_exit_code(code),
        Err(e) => {
            eprintln!("✗ {:#}", e);
            to_exit_code(CANONICAL_FAILURE_CODE)
        }
    }
}

/// Dispatch a command and return its normalized exit code.
async fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Test {
            unit_only,
            environment,
            extra_args,
        } => {
            let config = RunConfig::new(TestMode::from_unit_only(unit_only), extra_args);
            cmd_test(config, environment.into_settings()).await
        }
        Commands::InstallTools { manifest, go_bin } => cmd_install_tools(&manifest, &go_bin).await,
        Commands::Build { go_bin } => cmd_build(&go_bin).await,
    }
}

/// Run the test suite and report the normalized status
async fn cmd_test(config: RunConfig, settings: EnvironmentSettings) -> Result<i32> {
    let resolved = serde_json::to_string(&settings)?;
    debug!(mode = config.mode.name(), settings = %resolved, "Resolved test settings");

    let orchestrator = TestOrchestrator::new(
        Arc::new(ComposeEnvironment::new(settings.clone())),
        Arc::new(GoTestExecutor::new(settings.clone())),
        PollPolicy::from(&settings),
    );

    let outcome = orchestrator.run(&config).await;

    if let Some(e) = &outcome.startup_error {
        eprintln!("✗ {}", e);
    }
    if let Some(e) = &outcome.test_error {
        eprintln!("✗ {}", e);
    }
    if let Some(status) = outcome.test_status.filter(|status| *status != 0) {
        eprintln!("✗ {}", DevError::TestFailure { status });
    }

    Ok(outcome.exit_code())
}

/// Install the tools declared in the manifest
async fn cmd_install_tools(manifest: &Path, go_bin: &str) -> Result<i32> {
    let installed = install_tools(manifest, go_bin)
        .await
        .with_context(|| format!("Failed to install tools from {}", manifest.display()))?;

    println!("✓ Installed {} tool(s)", installed.len());
    Ok(0)
}

/// Build the project
async fn cmd_build(go_bin: &str) -> Result<i32> {
    let status = build_project(go_bin)
        .await
        .context("Failed to run the build")?;
    Ok(normalize_status(status))
}

fn to_exit_code(code: i32) -> ExitCode {
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(normalize_status(code) as u8)
    }
}
