use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::Value;

use super::crud::json_body;
use crate::auth::{hash_password, issue_session_token, verify_password, AuthError, Claims};
use crate::database::{
    models::{self, user::JoinRequest, user::LoginRequest, User},
    Condition, EntityKind, Row, StoreError,
};
use crate::error::ApiError;
use crate::middleware::{auth::clear_session_cookie, auth::session_cookie, ApiResponse, ApiResult, AuthUser};
use crate::services::get_validation_error;
use crate::state::AppState;

fn text(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

/// bcrypt is CPU bound; keep it off the async workers
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::error!("Password hashing failed: {}", e);
            Err(ApiError::internal_server_error("Failed to process password"))
        }
        Err(e) => {
            tracing::error!("Password hashing task failed: {}", e);
            Err(ApiError::internal_server_error("Failed to process password"))
        }
    }
}

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<User>, ApiError> {
    let rows = state
        .store
        .find_all(EntityKind::User, &Condition::new().eq("email", email))
        .await?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(models::from_row(EntityKind::User, row)?)),
        None => Ok(None),
    }
}

/// POST /auth/join
pub async fn join(
    State(state): State<AppState>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> ApiResult<User> {
    let body = json_body(payload)?;

    let submitted: Row = [
        ("email".to_string(), text(&body.email)),
        ("nick".to_string(), text(&body.nick)),
        ("password".to_string(), text(&body.password)),
    ]
    .into_iter()
    .collect();
    if let Some(failure) = get_validation_error(&submitted, EntityKind::User.required_fields()) {
        return Err(failure.into());
    }

    let email = body.email.unwrap_or_default().trim().to_string();
    let nick = body.nick.unwrap_or_default().trim().to_string();
    let password = body.password.unwrap_or_default();

    if find_by_email(&state, &email).await?.is_some() {
        return Err(ApiError::conflict(format!("{} is already registered", email)));
    }

    let cost = state.config.session.password_cost;
    let hashed = blocking(move || hash_password(&password, cost)).await?;

    let mut values = Row::new();
    values.insert("email".into(), Value::String(email.clone()));
    values.insert("nick".into(), Value::String(nick));
    values.insert("password".into(), Value::String(hashed));

    // A concurrent join can still win the race past the lookup above
    let row = state.store.insert(EntityKind::User, values).await.map_err(|e| match e {
        StoreError::Duplicate { .. } => ApiError::conflict(format!("{} is already registered", email)),
        other => other.into(),
    })?;
    let user: User = models::from_row(EntityKind::User, row)?;

    tracing::info!("New user joined: {} ({})", user.email, user.id);
    Ok(ApiResponse::created(user))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = json_body(payload)?;

    let submitted: Row = [
        ("email".to_string(), text(&body.email)),
        ("password".to_string(), text(&body.password)),
    ]
    .into_iter()
    .collect();
    if let Some(failure) = get_validation_error(&submitted, ["email", "password"]) {
        return Err(failure.into());
    }

    let email = body.email.unwrap_or_default().trim().to_string();
    let password = body.password.unwrap_or_default();

    let user = match find_by_email(&state, &email).await? {
        Some(user) => user,
        None => {
            tracing::warn!("Login attempt for unknown email {}", email);
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    let stored = user.password.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| {
            tracing::error!("Password check task failed: {}", e);
            ApiError::internal_server_error("Failed to process password")
        })?
        .unwrap_or_else(|e| {
            tracing::error!("Stored password hash for {} is unreadable: {}", user.email, e);
            false
        });
    if !matches {
        tracing::warn!("Failed login attempt for {}", email);
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let session = &state.config.session;
    let claims = Claims::new(user.id, user.email.clone(), user.nick.clone(), session.expiry_hours);
    let token = issue_session_token(&claims, session).map_err(|e| {
        tracing::error!("Failed to issue session token: {}", e);
        ApiError::internal_server_error("Failed to create session")
    })?;

    tracing::info!("User logged in: {} ({})", user.email, user.id);
    Ok((
        [(header::SET_COOKIE, session_cookie(session, &token))],
        ApiResponse::success(AuthUser::from(user)),
    )
        .into_response())
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> Response {
    tracing::info!("User logged out: {} ({})", user.email, user.id);
    (
        [(header::SET_COOKIE, clear_session_cookie(&state.config.session))],
        ApiResponse::no_content(),
    )
        .into_response()
}

/// GET /auth/me
pub async fn me(Extension(user): Extension<AuthUser>) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}
