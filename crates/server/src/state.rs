//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use pastport_agent::Orchestrator;
use pastport_config::{PersonaRegistry, Settings};

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config: Settings, orchestrator: Orchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Build providers and the orchestrator from settings
    pub fn from_settings(
        config: Settings,
        personas: PersonaRegistry,
    ) -> Result<Self, ServerError> {
        let orchestrator = Orchestrator::from_settings(&config, Arc::new(personas))?;
        Ok(Self::new(config, orchestrator))
    }
}
