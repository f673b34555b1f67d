//! Test-environment lifecycle orchestration.

use crate::environment::ServiceEnvironment;
use crate::executor::TestExecutor;
use crate::readiness::{poll_until_ready, PollPolicy};
use devctl_core::{DevError, RunConfig, TestMode};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Exit status reported for any failed run, whatever the underlying status was.
///
/// Raw test statuses are not guaranteed to fit a process exit code on every
/// platform, so they are collapsed to this value.
pub const CANONICAL_FAILURE_CODE: i32 = 1;

/// Map a raw status to a process exit code: 0 stays 0, anything else is
/// [`CANONICAL_FAILURE_CODE`].
pub fn normalize_status(status: i32) -> i32 {
    if status == 0 {
        0
    } else {
        CANONICAL_FAILURE_CODE
    }
}

/// Lifecycle phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    StartingServices,
    PollingReady,
    RunningTests,
    TearingDown,
    Done,
    Fatal,
}

/// Everything a caller needs to know once a run has finished.
#[derive(Debug)]
pub struct RunOutcome {
    pub mode: TestMode,

    /// Raw test status; `None` when the tests never ran to completion.
    pub test_status: Option<i32>,

    /// Fatal error raised before the tests could start.
    pub startup_error: Option<DevError>,

    /// Error that prevented the test command from reporting a status.
    pub test_error: Option<DevError>,

    /// Teardown error; logged, never decisive for the exit code.
    pub teardown_error: Option<DevError>,

    /// Phases entered, in order.
    pub phases: Vec<RunPhase>,

    pub duration_ms: u64,
}

impl RunOutcome {
    fn new(mode: TestMode) -> Self {
        Self {
            mode,
            test_status: None,
            startup_error: None,
            test_error: None,
            teardown_error: None,
            phases: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Process exit code for this run.
    pub fn exit_code(&self) -> i32 {
        match (&self.startup_error, self.test_status) {
            (None, Some(status)) => normalize_status(status),
            _ => CANONICAL_FAILURE_CODE,
        }
    }

    pub fn passed(&self) -> bool {
        self.exit_code() == 0
    }

    /// Whether the run aborted before the tests were invoked.
    pub fn is_fatal(&self) -> bool {
        self.startup_error.is_some()
    }

    /// Whether services were torn down during this run.
    pub fn tore_down(&self) -> bool {
        self.phases.contains(&RunPhase::TearingDown)
    }

    fn enter(&mut self, phase: RunPhase) {
        info!(phase = ?phase, "Entering phase");
        self.phases.push(phase);
    }
}

/// Sequences start, readiness polling, tests and teardown for one run.
pub struct TestOrchestrator {
    environment: Arc<dyn ServiceEnvironment>,
    executor: Arc<dyn TestExecutor>,
    policy: PollPolicy,
}

impl TestOrchestrator {
    pub fn new(
        environment: Arc<dyn ServiceEnvironment>,
        executor: Arc<dyn TestExecutor>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            environment,
            executor,
            policy,
        }
    }

    /// Run the tests in the mode `config` asks for.
    pub async fn run(&self, config: &RunConfig) -> RunOutcome {
        match config.mode {
            TestMode::UnitOnly => self.run_unit(&config.extra_args).await,
            TestMode::Full => self.run_full(&config.extra_args).await,
        }
    }

    /// Run only unit-tagged tests. Never touches the services environment.
    pub async fn run_unit(&self, extra_args: &[String]) -> RunOutcome {
        let start = Instant::now();
        let mut outcome = RunOutcome::new(TestMode::UnitOnly);

        self.run_tests(&mut outcome, extra_args).await;
        outcome.enter(RunPhase::Done);

        outcome.duration_ms = start.elapsed().as_millis() as u64;
        outcome
    }

    /// Bring the services up, wait for the database, run every test, and
    /// tear the services down again.
    ///
    /// Teardown happens exactly once, whether the tests passed, failed, or
    /// were skipped because the services never became ready.
    pub async fn run_full(&self, extra_args: &[String]) -> RunOutcome {
        let start = Instant::now();
        let mut outcome = RunOutcome::new(TestMode::Full);

        outcome.enter(RunPhase::StartingServices);
        let ready = match self.environment.start().await {
            Ok(()) => {
                outcome.enter(RunPhase::PollingReady);
                let environment = self.environment.clone();
                poll_until_ready(&self.policy, move || {
                    let environment = environment.clone();
                    async move { environment.probe().await }
                })
                .await
                .map(|report| {
                    info!(
                        attempts = report.attempts,
                        elapsed_ms = report.elapsed_ms,
                        "Database is ready"
                    );
                })
            }
            Err(e) => Err(e),
        };

        match ready {
            Ok(()) => self.run_tests(&mut outcome, extra_args).await,
            Err(e) => {
                error!(error = %e, "Database did not start");
                outcome.startup_error = Some(e);
            }
        }

        outcome.enter(RunPhase::TearingDown);
        if let Err(e) = self.environment.teardown().await {
            warn!(error = %e, "Teardown failed; continuing");
            outcome.teardown_error = Some(e);
        }

        outcome.enter(if outcome.is_fatal() {
            RunPhase::Fatal
        } else {
            RunPhase::Done
        });

        outcome.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            exit_code = outcome.exit_code(),
            duration_ms = outcome.duration_ms,
            "Full test run finished"
        );
        outcome
    }

    async fn run_tests(&self, outcome: &mut RunOutcome, extra_args: &[String]) {
        outcome.enter(RunPhase::RunningTests);
        match self.executor.run_tests(outcome.mode, extra_args).await {
            Ok(status) => {
                if status == 0 {
                    info!("Tests passed");
                } else {
                    info!(status, "Tests failed");
                }
                outcome.test_status = Some(status);
            }
            Err(e) => {
                error!(error = %e, "Could not run tests");
                outcome.test_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status(0), 0);
        assert_eq!(normalize_status(1), CANONICAL_FAILURE_CODE);
        assert_eq!(normalize_status(17), CANONICAL_FAILURE_CODE);
        assert_eq!(normalize_status(-1), CANONICAL_FAILURE_CODE);
        assert_eq!(normalize_status(256), CANONICAL_FAILURE_CODE);
        assert_eq!(normalize_status(i32::MIN), CANONICAL_FAILURE_CODE);
    }

    #[test]
    fn test_outcome_exit_codes() {
        let mut outcome = RunOutcome::new(TestMode::Full);
        assert_eq!(outcome.exit_code(), CANONICAL_FAILURE_CODE);

        outcome.test_status = Some(0);
        assert!(outcome.passed());

        outcome.test_status = Some(17);
        assert_eq!(outcome.exit_code(), CANONICAL_FAILURE_CODE);
    }

    #[test]
    fn test_teardown_error_does_not_change_exit_code() {
        let mut outcome = RunOutcome::new(TestMode::Full);
        outcome.test_status = Some(0);
        outcome.teardown_error = Some(DevError::TeardownFailed("boom".to_string()));
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn test_startup_error_is_fatal() {
        let mut outcome = RunOutcome::new(TestMode::Full);
        outcome.startup_error = Some(DevError::ServicesStart("no daemon".to_string()));
        assert!(outcome.is_fatal());
        assert_eq!(outcome.exit_code(), CANONICAL_FAILURE_CODE);
    }
}
