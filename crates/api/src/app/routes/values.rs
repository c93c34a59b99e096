use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(submit_value))
        .route("/all", get(list_all))
        .route("/current", get(list_current))
}

/// Accept an index for computation. Responds as soon as the job is published.
pub async fn submit_value(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SubmitIndexRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return errors::json_error(rejection.status(), "invalid_body", rejection.body_text());
        }
    };
    let raw = body.raw_index();

    match services.submit(&raw).await {
        Ok(index) => {
            tracing::debug!(%index, "submission accepted");
            (StatusCode::OK, Json(dto::SubmitIndexResponse { working: true })).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// Every submitted index, oldest first.
pub async fn list_all(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.list_all().await {
        Ok(indices) => Json(dto::submitted_rows(&indices)).into_response(),
        Err(e) => errors::query_error_to_response(e),
    }
}

/// Current cache value per index (pending entries included).
pub async fn list_current(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_current().await {
        Ok(current) => Json(dto::current_values(&current)).into_response(),
        Err(e) => errors::query_error_to_response(e),
    }
}
