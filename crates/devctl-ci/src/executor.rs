//! Test execution.

use async_trait::async_trait;
use devctl_core::{EnvironmentSettings, Result, TestMode};

use crate::runner::StepRunner;
use crate::step::StepConfig;

/// Something that runs the project's test suite and reports its status.
#[async_trait]
pub trait TestExecutor: Send + Sync {
    /// Run the tests and return the raw exit status.
    async fn run_tests(&self, mode: TestMode, extra_args: &[String]) -> Result<i32>;
}

/// Runs the configured Go test program with inherited output.
#[derive(Debug, Clone)]
pub struct GoTestExecutor {
    settings: EnvironmentSettings,
}

impl GoTestExecutor {
    pub fn new(settings: EnvironmentSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl TestExecutor for GoTestExecutor {
    async fn run_tests(&self, mode: TestMode, extra_args: &[String]) -> Result<i32> {
        let step = StepConfig::go_test(&self.settings, mode, extra_args);

        // Blank lines set the test runner's own output apart from our logs.
        println!();
        let result = StepRunner::execute(&step).await;
        println!();

        Ok(result?.exit_code)
    }
}

/// Build the project with `<go_bin> build`, returning the raw status.
pub async fn build_project(go_bin: &str) -> Result<i32> {
    let result = StepRunner::execute(&StepConfig::go_build(go_bin)).await?;
    Ok(result.exit_code)
}
