use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        // Mock Jira search surface
        .route("/rest/api/3/search", get(handlers::mock_search))
        // Frontend-facing API
        .route("/api/tickets", post(handlers::list_tickets))
        .route("/api/query", post(handlers::resolve_query))
        .route("/api/summary", post(handlers::summarize))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        // The demo frontend is a browser app served from another origin
        .layer(CorsLayer::permissive())
}
