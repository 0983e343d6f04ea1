use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_token;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication, no account
    let public = Router::new()
        .route("/health", get(handlers::ops::health_check))
        .route("/metrics", get(handlers::ops::render_metrics))
        .route("/api/copy-trading/monitor", get(handlers::monitor::report));

    // Account-scoped routes: keyed by the X-User-Fingerprint header
    let account = Router::new()
        // Configs
        .route("/api/copy-trading/enable", post(handlers::copy_trading::enable))
        .route("/api/copy-trading/disable", post(handlers::copy_trading::disable))
        .route("/api/copy-trading/settings", put(handlers::copy_trading::update_settings))
        .route("/api/copy-trading/configs", get(handlers::copy_trading::list_configs))
        .route("/api/copy-trading/configs/:wallet_id", get(handlers::copy_trading::get_config))
        // Decisions & positions
        .route("/api/copy-trading/configs/:wallet_id/decisions", get(handlers::positions::list_decisions))
        .route("/api/copy-trading/decisions/recent", get(handlers::positions::recent_decisions))
        .route("/api/copy-trading/positions", get(handlers::positions::list_open))
        .route("/api/copy-trading/positions/:id/close", post(handlers::positions::close))
        // Analytics
        .route("/api/copy-trading/configs/:wallet_id/performance", get(handlers::analytics::performance))
        .route("/api/copy-trading/dashboard", get(handlers::analytics::dashboard));

    // Signal-generator surface: require Bearer token when API_TOKEN is set
    let internal = Router::new()
        .route("/api/internal/configs/:id/active", get(handlers::internal::copy_active))
        .route("/api/internal/decisions", post(handlers::internal::record))
        .route("/api/internal/decisions/:id/execute", post(handlers::internal::execute))
        .route("/api/internal/decisions/:id/expire", post(handlers::internal::expire))
        .route("/api/internal/decisions/:id/mark", post(handlers::internal::mark))
        .layer(middleware::from_fn_with_state(state.clone(), require_token));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(account)
        .merge(internal)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
