//! User identity endpoints.
//!
//! # Examples
//!
//! Create a user (and receive the `session` cookie):
//! ```bash
//! curl -c jar -X POST http://localhost:8080/users/new \
//!   -H "Content-Type: application/json" -d '{"name": "alice"}'
//! ```

use axum::{
    Json,
    body::Bytes,
    extract::{Extension, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use vpoker::User;

use super::{
    AppState,
    error::{ApiError, ApiResult},
    session::{self, Session},
};

#[derive(Debug, Default, Deserialize)]
pub struct NewUserRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
    pub created: bool,
}

/// Create a user, or return the one the session cookie already names.
///
/// The name comes from the body, else the `last_name` cookie, else an
/// anonymous `Anon<N>`. Sets the `session` and `last_name` cookies.
pub async fn new_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if let Some(Ok(existing)) = Session::from_headers(&headers)
        && let Ok(user) = state.manager.user(existing.user_id).await
    {
        return Ok(Json(UserResponse {
            user,
            created: false,
        })
        .into_response());
    }

    let request: NewUserRequest = if body.is_empty() {
        NewUserRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid body: {}", e)))?
    };
    let name = request
        .name
        .or_else(|| session::last_name(&headers))
        .unwrap_or_default();

    let user = state.manager.register_user(&name).await;
    crate::metrics::known_users(state.manager.user_count().await);
    with_cookies(&user, UserResponse {
        user: user.clone(),
        created: true,
    })
}

/// The current user.
pub async fn get_profile(Extension(user): Extension<User>) -> ApiResult<User> {
    Ok(Json(user))
}

/// Rename the current user. Refreshes both cookies.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<ProfileRequest>,
) -> Result<Response, ApiError> {
    let user = state.manager.rename_user(user.id, &request.name).await?;
    with_cookies(&user, user.clone())
}

fn with_cookies<T: Serialize>(user: &User, body: T) -> Result<Response, ApiError> {
    let cookies = session::set_cookies(user)
        .map_err(|e| ApiError::internal(format!("cannot encode session: {}", e)))?;
    Ok((cookies, Json(body)).into_response())
}
