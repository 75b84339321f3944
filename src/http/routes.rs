use super::state::AppState;
use super::{handlers, ws};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/interviews", post(handlers::schedule_interview))
        .route(
            "/interviews/:session_id/invite",
            post(handlers::invite_interview),
        )
        .route(
            "/interviews/:session_id/cancel",
            post(handlers::cancel_interview),
        )
        .route(
            "/interviews/:session_id/no-show",
            post(handlers::mark_no_show),
        )
        // Live channel
        .route("/interviews/:session_id/ws", get(ws::interview_socket))
        // Session queries
        .route(
            "/interviews/:session_id/status",
            get(handlers::get_interview_status),
        )
        .route(
            "/interviews/:session_id/transcript",
            get(handlers::get_interview_transcript),
        )
        .route(
            "/interviews/:session_id/signals",
            get(handlers::get_interview_signals),
        )
        .route(
            "/interviews/:session_id/score",
            get(handlers::get_interview_score),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
