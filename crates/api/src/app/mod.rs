//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/cache/bus wiring, in-memory or persistent
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use fibcalc_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, ServiceError};

/// Build the full HTTP router from configuration (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, ServiceError> {
    let services = services::build_services(config).await?;
    Ok(router_with_services(Arc::new(services)))
}

/// Build the router around already-wired services.
pub fn router_with_services(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .nest("/values", routes::values::router())
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::trace_requests))
}
