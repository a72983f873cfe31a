//! Session middleware for endpoints that need a known user.
//!
//! The middleware decodes the `session` cookie, resolves it against the
//! user registry and injects the [`User`] into request extensions for
//! downstream handlers.
//!
//! # Extracting the User
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use vpoker::User;
//!
//! async fn protected_handler(Extension(user): Extension<User>) -> String {
//!     format!("Hello {}", user.name)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use super::{AppState, session::Session};

/// Session middleware that resolves the cookie and injects the user.
///
/// # Behavior
///
/// - **Success**: Known user → Injects `User` into request extensions → Calls next handler
/// - **Missing cookie**: Returns `401 Unauthorized`
/// - **Malformed cookie**: Returns `400 Bad Request`
/// - **Unknown user**: Returns `401 Unauthorized`
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let session = match Session::from_headers(request.headers()) {
        Some(Ok(session)) => session,
        Some(Err(e)) => {
            tracing::debug!(error = %e, "Rejected session cookie");
            return Err(StatusCode::BAD_REQUEST);
        }
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match state.manager.user(session.user_id).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}
