use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde_json::Value;

use crate::database::{
    models::{self, Resource},
    Condition, EntityKind, Row,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{get_validation_error, require_existing, update_for_each, ValidationFailure};
use crate::state::AppState;
use crate::types::Field;

/// Collection and item routes for one resource, e.g. `/records` and `/records/:id`
pub fn resource_routes<R: Resource>() -> Router<AppState> {
    let path = R::KIND.path();
    Router::new()
        .route(path, get(list::<R>).post(create::<R>))
        .route(
            &format!("{}/:id", path),
            get(fetch::<R>).patch(update::<R>).delete(remove::<R>),
        )
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::invalid_json(rejection.body_text())
    })
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid id '{}': must be an integer", raw)))
}

fn decode<R: Resource>(row: Row) -> Result<R, ApiError> {
    Ok(models::from_row(R::KIND, row)?)
}

/// Target table of a foreign-key column, if `column` is one
fn referenced_kind(kind: EntityKind, column: &str) -> Option<EntityKind> {
    kind.column(column).and_then(|c| c.references)
}

/// Supplied PATCH values must pass the same emptiness check as create
fn blank_values(fields: &[(&str, Field<Value>)]) -> Option<ValidationFailure> {
    let supplied: Row = fields
        .iter()
        .filter_map(|(column, field)| match field {
            Field::Value(value) => Some((column.to_string(), value.clone())),
            _ => None,
        })
        .collect();
    get_validation_error(&supplied, supplied.keys().map(String::as_str))
}

/// POST /{resource}
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<R::Create>, JsonRejection>,
) -> ApiResult<R> {
    let body = json_body(payload)?;
    let params = R::create_params(&body);

    if let Some(failure) = get_validation_error(&params, R::KIND.required_fields()) {
        return Err(failure.into());
    }

    for column in R::KIND.foreign_keys() {
        let Some(target) = column.references else { continue };
        let id = params
            .get(column.name)
            .and_then(Value::as_i64)
            .ok_or_else(|| ApiError::bad_request(format!("{} must be an integer id", column.name)))?;
        let label = format!("POST {} {} {} not found", uri.path(), column.name, id);
        require_existing(state.store.as_ref(), target, id, &label).await?;
    }

    let row = state.store.insert(R::KIND, params).await?;
    let entity: R = decode(row)?;

    tracing::info!("{} created by {}", R::KIND, user.email);
    Ok(ApiResponse::created(entity))
}

/// GET /{resource}; foreign-key query parameters narrow the result
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    OriginalUri(uri): OriginalUri,
    query: Result<Query<R::Filter>, QueryRejection>,
) -> Result<Response, ApiError> {
    let filter = query_params(query)?;

    let mut condition = Condition::new();
    for (column, id) in R::filter_params(&filter) {
        if let Some(target) = referenced_kind(R::KIND, column) {
            let label = format!("GET {} {} {} not found", uri.path(), column, id);
            require_existing(state.store.as_ref(), target, id, &label).await?;
        }
        condition.push(column, id);
    }

    let rows = state.store.find_all(R::KIND, &condition).await?;
    if rows.is_empty() {
        return Ok(ApiResponse::no_content().into_response());
    }

    let entities = rows.into_iter().map(decode::<R>).collect::<Result<Vec<_>, _>>()?;
    Ok(ApiResponse::success(entities).into_response())
}

/// GET /{resource}/:id
pub async fn fetch<R: Resource>(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    OriginalUri(uri): OriginalUri,
    Path(raw_id): Path<String>,
) -> ApiResult<R> {
    let id = parse_id(&raw_id)?;
    let row = require_existing(state.store.as_ref(), R::KIND, id, uri.path()).await?;
    Ok(ApiResponse::success(decode(row)?))
}

/// PATCH /{resource}/:id
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    OriginalUri(uri): OriginalUri,
    Path(raw_id): Path<String>,
    payload: Result<Json<R::Patch>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    let mut target = require_existing(state.store.as_ref(), R::KIND, id, uri.path()).await?;
    let body = json_body(payload)?;

    let fields = R::patch_fields(&body);

    let not_null: Vec<&str> = fields
        .iter()
        .filter(|(column, field)| {
            field.is_null() && !R::KIND.column(column).map(|c| c.nullable).unwrap_or(false)
        })
        .map(|(column, _)| *column)
        .collect();
    if !not_null.is_empty() {
        return Err(ApiError::bad_request(format!(
            "{} {{{}}} Not Null",
            uri.path(),
            not_null.join(", ")
        )));
    }

    if fields.iter().all(|(_, field)| field.is_absent()) {
        return Err(ApiError::bad_request(format!(
            "{} At least one content is required",
            uri.path()
        )));
    }

    if let Some(failure) = blank_values(&fields) {
        return Err(failure.into());
    }

    for (column, field) in &fields {
        let (Some(kind), Field::Value(value)) = (referenced_kind(R::KIND, column), field) else {
            continue;
        };
        let fk = value
            .as_i64()
            .ok_or_else(|| ApiError::bad_request(format!("{} must be an integer id", column)))?;
        let label = format!("PATCH {} {} {} not found", uri.path(), column, fk);
        require_existing(state.store.as_ref(), kind, fk, &label).await?;
    }

    if update_for_each(state.store.as_ref(), R::KIND, &mut target, &fields).await? {
        return Ok(ApiResponse::no_content().into_response());
    }

    tracing::info!("{} {} updated by {}", R::KIND, id, user.email);
    Ok(ApiResponse::created(decode::<R>(target)?).into_response())
}

/// DELETE /{resource}/:id
pub async fn remove<R: Resource>(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    OriginalUri(uri): OriginalUri,
    Path(raw_id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&raw_id)?;
    require_existing(state.store.as_ref(), R::KIND, id, uri.path()).await?;

    // Gone between the lookup and the delete
    if !state.store.delete(R::KIND, id).await? {
        return Err(ApiError::not_found(uri.path().to_string()));
    }

    tracing::info!("{} {} deleted by {}", R::KIND, id, user.email);
    Ok(ApiResponse::no_content())
}
