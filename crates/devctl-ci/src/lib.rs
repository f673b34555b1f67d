//! devctl CI - test-environment orchestration for Go projects
//!
//! Provides:
//! - Typed subprocess steps (compose, test, install, build)
//! - Readiness polling with a fixed interval and an overall deadline
//! - A lifecycle orchestrator that always tears the environment down
//! - Installation of the tools declared in a `tools.go` manifest

pub mod environment;
pub mod executor;
pub mod fakes;
pub mod orchestrator;
pub mod readiness;
pub mod runner;
pub mod step;
pub mod tools;

// Re-export key types
pub use environment::{ComposeEnvironment, ServiceEnvironment};
pub use executor::{build_project, GoTestExecutor, TestExecutor};
pub use orchestrator::{
    normalize_status, RunOutcome, RunPhase, TestOrchestrator, CANONICAL_FAILURE_CODE,
};
pub use readiness::{poll_until_ready, PollPolicy, ReadinessReport};
pub use runner::{StepResult, StepRunner};
pub use step::{OutputMode, StepConfig};
pub use tools::{install_tools, parse_tools_manifest, DEFAULT_MANIFEST};
