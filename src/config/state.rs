// Application state shared with every handler

use std::sync::Arc;
use crate::config::environment::EnvironmentVariables;

#[derive(Debug, Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
}

impl AppState {
    /// Creates a state around an already loaded configuration
    pub fn new(environment: EnvironmentVariables) -> Self {
        Self {
            environment: Arc::new(environment),
        }
    }

    /// Builds the state from the process-wide configuration singleton
    pub fn from_env() -> anyhow::Result<Self> {
        let environment: &'static EnvironmentVariables = EnvironmentVariables::instance()?;
        Ok(Self::new(environment.clone()))
    }
}
