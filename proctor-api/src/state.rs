use std::sync::Arc;
use proctor_core::SeatingService;
use proctor_store::RedisClient;
use crate::realtime::RealtimeHub;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub seating: Arc<SeatingService>,
    pub realtime: Arc<RealtimeHub>,
    /// Rate limiting is skipped when absent.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
}
