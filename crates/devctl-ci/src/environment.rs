//! Supporting-services environment (the database container).

use async_trait::async_trait;
use devctl_core::{DevError, EnvironmentSettings, Result};
use tracing::{debug, info};

use crate::runner::StepRunner;
use crate::step::StepConfig;

/// Lifecycle of the services a full test run depends on.
#[async_trait]
pub trait ServiceEnvironment: Send + Sync {
    /// Issue the start request. Returns before the services are ready.
    async fn start(&self) -> Result<()>;

    /// Run the readiness probe once. `Err` carries the failure cause.
    async fn probe(&self) -> std::result::Result<(), String>;

    /// Stop and remove the services.
    async fn teardown(&self) -> Result<()>;
}

/// Services managed through a container-compose tool.
#[derive(Debug, Clone)]
pub struct ComposeEnvironment {
    settings: EnvironmentSettings,
}

impl ComposeEnvironment {
    pub fn new(settings: EnvironmentSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EnvironmentSettings {
        &self.settings
    }
}

#[async_trait]
impl ServiceEnvironment for ComposeEnvironment {
    async fn start(&self) -> Result<()> {
        let result = StepRunner::execute(&StepConfig::compose_up(&self.settings))
            .await
            .map_err(|e| DevError::ServicesStart(e.to_string()))?;

        if !result.passed() {
            return Err(DevError::ServicesStart(result.failure_reason()));
        }
        info!(compose_file = %self.settings.compose_file.display(), "Started services");
        Ok(())
    }

    async fn probe(&self) -> std::result::Result<(), String> {
        let result = StepRunner::execute(&StepConfig::compose_probe(&self.settings))
            .await
            .map_err(|e| e.to_string())?;

        if result.passed() {
            Ok(())
        } else {
            Err(result.failure_reason())
        }
    }

    async fn teardown(&self) -> Result<()> {
        let result = StepRunner::execute(&StepConfig::compose_down(&self.settings))
            .await
            .map_err(|e| DevError::TeardownFailed(e.to_string()))?;

        if !result.passed() {
            return Err(DevError::TeardownFailed(result.failure_reason()));
        }
        debug!("Stopped services");
        Ok(())
    }
}
