pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod types;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::database::models::{DateRecord, Element, ElementInt, Record, Variable};
use crate::handlers::{auth as auth_handlers, crud, system};
use crate::middleware::session_auth_middleware;
use crate::state::AppState;

/// Build the full router over `state`
pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/auth/join", post(auth_handlers::join))
        .route("/auth/login", post(auth_handlers::login));

    let protected = Router::new()
        .merge(crud::resource_routes::<Variable>())
        .merge(crud::resource_routes::<DateRecord>())
        .merge(crud::resource_routes::<Record>())
        .merge(crud::resource_routes::<Element>())
        .merge(crud::resource_routes::<ElementInt>())
        .route("/auth/me", get(auth_handlers::me))
        .route("/auth/logout", post(auth_handlers::logout))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_middleware,
        ));

    let mut router = Router::new()
        .merge(public)
        .merge(protected)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if let Some(cors) = cors_layer(&state.config.security) {
        router = router.layer(cors);
    }

    router.with_state(state)
}

/// Credentialed CORS for the configured origins; `None` when disabled
fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
    )
}
