//! In-memory fakes for the orchestrator seams (testing only)
//!
//! Provides `FakeEnvironment` and `FakeExecutor`, which script their
//! responses and count every call so lifecycle guarantees can be asserted
//! without a container runtime or a Go toolchain.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use devctl_core::{DevError, Result, TestMode};

use crate::environment::ServiceEnvironment;
use crate::executor::TestExecutor;

// ---------------------------------------------------------------------------
// FakeEnvironment
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct EnvironmentCalls {
    starts: u32,
    probes: u32,
    teardowns: u32,
}

/// Services environment whose probe answers come from a script.
///
/// Once the script is exhausted every further probe gets `fallback`.
#[derive(Debug)]
pub struct FakeEnvironment {
    script: Mutex<VecDeque<std::result::Result<(), String>>>,
    fallback: std::result::Result<(), String>,
    fail_start: bool,
    fail_teardown: bool,
    calls: Mutex<EnvironmentCalls>,
}

impl FakeEnvironment {
    fn with_script(
        script: Vec<std::result::Result<(), String>>,
        fallback: std::result::Result<(), String>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            fail_start: false,
            fail_teardown: false,
            calls: Mutex::new(EnvironmentCalls::default()),
        }
    }

    /// Ready on the first probe.
    pub fn ready() -> Self {
        Self::with_script(Vec::new(), Ok(()))
    }

    /// Probe fails `failures` times, then reports ready.
    pub fn ready_after(failures: usize) -> Self {
        let script = (1..=failures)
            .map(|n| Err(format!("connection refused (probe {})", n)))
            .collect();
        Self::with_script(script, Ok(()))
    }

    /// Probe never succeeds.
    pub fn never_ready() -> Self {
        Self::with_script(Vec::new(), Err("no response".to_string()))
    }

    /// `start` fails.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// `teardown` fails.
    pub fn failing_teardown(mut self) -> Self {
        self.fail_teardown = true;
        self
    }

    pub fn start_calls(&self) -> u32 {
        self.calls.lock().unwrap().starts
    }

    pub fn probe_calls(&self) -> u32 {
        self.calls.lock().unwrap().probes
    }

    pub fn teardown_calls(&self) -> u32 {
        self.calls.lock().unwrap().teardowns
    }
}

#[async_trait]
impl ServiceEnvironment for FakeEnvironment {
    async fn start(&self) -> Result<()> {
        self.calls.lock().unwrap().starts += 1;
        if self.fail_start {
            return Err(DevError::ServicesStart(
                "Cannot connect to the Docker daemon".to_string(),
            ));
        }
        Ok(())
    }

    async fn probe(&self) -> std::result::Result<(), String> {
        self.calls.lock().unwrap().probes += 1;
        let mut script = self.script.lock().unwrap();
        script.pop_front().unwrap_or_else(|| self.fallback.clone())
    }

    async fn teardown(&self) -> Result<()> {
        self.calls.lock().unwrap().teardowns += 1;
        if self.fail_teardown {
            return Err(DevError::TeardownFailed("network still in use".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeExecutor
// ---------------------------------------------------------------------------

/// Test executor returning a fixed status and recording each invocation.
#[derive(Debug)]
pub struct FakeExecutor {
    status: Option<i32>,
    calls: Mutex<Vec<(TestMode, Vec<String>)>>,
}

impl FakeExecutor {
    /// Every run reports `status`.
    pub fn with_status(status: i32) -> Self {
        Self {
            status: Some(status),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every run fails to spawn the test program.
    pub fn unspawnable() -> Self {
        Self {
            status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Mode and extra arguments of every invocation, in order.
    pub fn calls(&self) -> Vec<(TestMode, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestExecutor for FakeExecutor {
    async fn run_tests(&self, mode: TestMode, extra_args: &[String]) -> Result<i32> {
        self.calls
            .lock()
            .unwrap()
            .push((mode, extra_args.to_vec()));
        self.status.ok_or_else(|| DevError::Spawn {
            program: "gotest".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    }
}
