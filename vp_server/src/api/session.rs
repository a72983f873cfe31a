//! Session cookies.
//!
//! A browser is identified by the `session` cookie: hex-encoded JSON of
//! the user's id, creation time and name. The `last_name` cookie remembers
//! the most recent display name so a returning browser that lost its
//! session gets its old name back.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, SET_COOKIE},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vpoker::{User, table::UserId};

pub const SESSION_COOKIE: &str = "session";
pub const LAST_NAME_COOKIE: &str = "last_name";

/// Session cookie errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Cookie value is not hex
    #[error("malformed session cookie: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Decoded cookie is not the expected JSON
    #[error("malformed session cookie: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identity carried by the `session` cookie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub name: String,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            created_at: user.created_at,
            name: user.name.clone(),
        }
    }
}

impl Session {
    pub fn encode(&self) -> Result<String, SessionError> {
        Ok(hex::encode(serde_json::to_vec(self)?))
    }

    pub fn decode(value: &str) -> Result<Self, SessionError> {
        let bytes = hex::decode(value)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The session in the request's cookies, if any.
    pub fn from_headers(headers: &HeaderMap) -> Option<Result<Self, SessionError>> {
        cookie(headers, SESSION_COOKIE).map(|value| Self::decode(&value))
    }
}

/// Value of the cookie `name` across all `Cookie` headers.
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` headers for `user`: a fresh session and the remembered name.
pub fn set_cookies(user: &User) -> Result<HeaderMap, SessionError> {
    let mut headers = HeaderMap::new();
    let session = Session::from(user).encode()?;
    let name = hex::encode(user.name.as_bytes());
    for cookie in [
        format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax"),
        format!("{LAST_NAME_COOKIE}={name}; Path=/; SameSite=Lax"),
    ] {
        // Both values are hex, so the header is always valid.
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(SET_COOKIE, value);
        }
    }
    Ok(headers)
}

/// The remembered display name, if the browser sent a readable one.
pub fn last_name(headers: &HeaderMap) -> Option<String> {
    let bytes = hex::decode(cookie(headers, LAST_NAME_COOKIE)?).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> User {
        User::new(Uuid::new_v4(), "Zoë; admin=1", Utc::now())
    }

    #[test]
    fn test_session_decodes_what_it_encodes() {
        let user = user();
        let encoded = Session::from(&user).encode().unwrap();

        assert!(encoded.chars().all(|c| c.is_ascii_hexdigit()));
        let decoded = Session::decode(&encoded).unwrap();
        assert_eq!(decoded.user_id, user.id);
        assert_eq!(decoded.name, user.name);
    }

    #[test]
    fn test_malformed_cookie_is_an_error() {
        assert!(matches!(Session::decode("zz"), Err(SessionError::Hex(_))));
        let not_json = hex::encode("hello");
        assert!(matches!(Session::decode(&not_json), Err(SessionError::Json(_))));
    }

    #[test]
    fn test_cookie_lookup_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; session=abc"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(cookie(&headers, "session").as_deref(), Some("abc"));
        assert_eq!(cookie(&headers, "other").as_deref(), Some("1"));
        assert_eq!(cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_set_cookies_round_trip_through_request() {
        let user = user();
        let set = set_cookies(&user).unwrap();
        assert_eq!(set.get_all(SET_COOKIE).iter().count(), 2);

        // Echo the cookies back the way a browser would.
        let echoed = set
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        let mut request = HeaderMap::new();
        request.insert(COOKIE, HeaderValue::from_str(&echoed).unwrap());

        let session = Session::from_headers(&request).unwrap().unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(last_name(&request).as_deref(), Some(user.name.as_str()));
    }
}
