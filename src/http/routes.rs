//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::config::Config;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS from `CLIENT_ORIGIN`: `*` for any origin, otherwise a comma-separated list
fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let allowed_origins: Vec<HeaderValue> = config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    cors.allow_origin(allowed_origins)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub connections: usize,
    pub players: usize,
    pub projectiles: usize,
    pub tick: u64,
    pub game_over: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health(&state))
}

pub fn health(state: &AppState) -> HealthResponse {
    let world = state.world.read();
    HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connections: state.registry.len(),
        players: world.players.len(),
        projectiles: world.projectiles.len(),
        tick: world.tick,
        game_over: world.is_game_over(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Character;
    use uuid::Uuid;

    fn state() -> AppState {
        let config = Config::from_lookup(|_| None).unwrap();
        AppState::new(config).0
    }

    #[test]
    fn test_health_reports_world_counts() {
        let state = state();
        let id = Uuid::new_v4();
        {
            let mut world = state.world.write();
            world.add_player(id, "ann".into(), Character::Andree);
            world.try_shoot(id);
        }
        let _rx = state.registry.register(id);

        let h = health(&state);
        assert_eq!(h.status, "ok");
        assert_eq!(h.connections, 1);
        assert_eq!(h.players, 1);
        assert_eq!(h.projectiles, 1);
        assert!(!h.game_over);
    }

    #[test]
    fn test_router_builds_for_both_origin_modes() {
        let _ = build_router(state());
        let config = Config::from_lookup(|key| {
            (key == "CLIENT_ORIGIN").then(|| "https://a.example, https://b.example".to_string())
        })
        .unwrap();
        let _ = build_router(AppState::new(config).0);
    }
}
