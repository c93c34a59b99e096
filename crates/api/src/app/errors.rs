use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use fibcalc_infra::{DispatchError, QueryError};

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match &err {
        DispatchError::Validation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
        }
        DispatchError::Store(_) => {
            tracing::error!(error = %err, "submission failed before any write");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
        }
        DispatchError::Cache { .. } => {
            tracing::error!(error = %err, "submission recorded without placeholder");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "cache_error", err.to_string())
        }
        DispatchError::Publish { .. } => {
            tracing::error!(error = %err, "submission recorded without job");
            json_error(StatusCode::BAD_GATEWAY, "publish_error", err.to_string())
        }
    }
}

pub fn query_error_to_response(err: QueryError) -> axum::response::Response {
    tracing::error!(error = %err, "query failed");
    let code = match err {
        QueryError::Store(_) => "store_error",
        QueryError::Cache(_) => "cache_error",
    };
    json_error(StatusCode::SERVICE_UNAVAILABLE, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
