//! HTTP/WebSocket API for the table server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower**: Middleware for CORS, sessions and request ids
//! - **Cookies**: The `session` cookie identifies the browser's user
//!
//! # Modules
//!
//! - [`users`]: Creating users and editing their profile
//! - [`games`]: Creating, joining and acting on tables
//! - [`websocket`]: The live push stream of a table
//! - [`middleware`]: Session middleware for protected endpoints
//! - [`session`]: Session cookie encoding
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                    - Health check (public)
//! POST /users/new                 - Create user, set session cookie (public)
//! GET  /users/profile             - Current user
//! POST /users/profile             - Rename current user
//! POST /games/new                 - Create table, creator seated
//! GET  /games/{id}                - Seated players
//! GET  /games/{id}/state          - Filtered table snapshot
//! POST /games/{id}/join           - Sit down
//! POST /games/{id}/update         - Move or turn an item
//! POST /games/{id}/take_card      - Pick up an item
//! POST /games/{id}/show_card      - Reveal an owned card
//! POST /games/{id}/shuffle        - Gather and reshuffle the deck
//! GET  /games/{id}/listen         - WebSocket push stream
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod error;
pub mod games;
pub mod middleware;
pub mod request_id;
pub mod session;
pub mod users;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use vpoker::TableManager;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request (cheap due to the Arc wrapper).
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TableManager>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Arguments
///
/// - `state`: Application state with the table manager
///
/// # Returns
///
/// Configured Axum router ready to serve requests
///
/// # Example
///
/// ```rust,no_run
/// # use vp_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    // Public routes (no session middleware)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/users/new", post(users::new_user));

    // Protected routes (require a known session)
    let protected_routes = Router::new()
        .route(
            "/users/profile",
            get(users::get_profile).post(users::update_profile),
        )
        .route("/games/new", post(games::new_table))
        .route("/games/{table_id}", get(games::get_table))
        .route("/games/{table_id}/state", get(games::get_state))
        .route("/games/{table_id}/join", post(games::join_table))
        .route("/games/{table_id}/update", post(games::update_item))
        .route("/games/{table_id}/take_card", post(games::take_card))
        .route("/games/{table_id}/show_card", post(games::show_card))
        .route("/games/{table_id}/shuffle", post(games::shuffle))
        .route("/games/{table_id}/listen", get(websocket::websocket_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","tables":2,"users":5,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let tables = state.manager.table_count().await;
    let users = state.manager.user_count().await;

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": tables,
        "users": users,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
