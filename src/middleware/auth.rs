use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::auth::verify_session_token;
use crate::config::SessionConfig;
use crate::database::{models, EntityKind};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user for the current request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub nick: String,
}

impl From<models::User> for AuthUser {
    fn from(user: models::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            nick: user.nick,
        }
    }
}

/// Session middleware: validates the session cookie, reloads the user and
/// injects [`AuthUser`] into the request before any handler runs.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = &state.config.session;

    let token = extract_session_token(request.headers(), &session.cookie_name).map_err(|msg| {
        tracing::debug!("Rejected request to {}: {}", request.uri(), msg);
        ApiError::unauthorized(msg)
    })?;

    let claims = verify_session_token(&token, session).map_err(|e| {
        tracing::warn!("Rejected session token: {}", e);
        ApiError::unauthorized("Invalid or expired session")
    })?;

    // The account may have been removed since the cookie was issued
    let row = state
        .store
        .find_by_id(EntityKind::User, claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Session for unknown user {} ({})", claims.sub, claims.email);
            ApiError::unauthorized("Session user no longer exists")
        })?;
    let user: models::User = models::from_row(EntityKind::User, row)?;

    tracing::debug!("Session validated for {} ({})", user.email, user.id);
    request.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(request).await)
}

/// Session token from the cookie, falling back to `Authorization: Bearer`
fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Result<String, &'static str> {
    if let Some(token) = cookie_value(headers, cookie_name) {
        return Ok(token);
    }

    let auth_header = match headers.get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Err("Login required"),
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty session token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

/// `Set-Cookie` value establishing the session
pub fn session_cookie(session: &SessionConfig, token: &str) -> String {
    let max_age = session.expiry_hours * 3600;
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        session.cookie_name, token, max_age
    );
    if session.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session immediately
pub fn clear_session_cookie(session: &SessionConfig) -> String {
    let mut cookie = format!("{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0", session.cookie_name);
    if session.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}
