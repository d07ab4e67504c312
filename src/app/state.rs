//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::RoomRegistry;
use crate::matchmaking::MatchmakingService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: RoomRegistry,
    pub matchmaking: MatchmakingService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = RoomRegistry::new();
        let matchmaking = MatchmakingService::new(registry.clone());

        Self {
            config: Arc::new(config),
            registry,
            matchmaking,
        }
    }
}
