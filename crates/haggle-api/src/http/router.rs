//! Axum router configuration with middleware.
//!
//! All chat routes are under `/api/v1/`. Middleware: CORS, request tracing.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Conversations
        .route(
            "/conversations",
            post(handlers::conversation::create_conversation)
                .get(handlers::conversation::list_conversations),
        )
        .route(
            "/conversations/{id}",
            get(handlers::conversation::get_conversation),
        )
        // Messages and read state
        .route(
            "/conversations/{id}/messages",
            get(handlers::message::list_messages).post(handlers::message::send_message),
        )
        .route("/conversations/{id}/read", post(handlers::message::mark_read))
        .route("/conversations/{id}/unread", get(handlers::message::unread_count))
        // Push devices
        .route(
            "/devices",
            post(handlers::device::register_device).delete(handlers::device::unregister_device),
        )
        // Counterpart display cache
        .route("/profile", put(handlers::profile::upsert_profile))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness check (no caller identity required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
