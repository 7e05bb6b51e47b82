//! HTTP surface for the single-record save.
//!
//! Handlers return [`Result`], so every failure is rendered as an
//! [`ErrorResponse`] body with a stable machine-readable code.

pub mod rest;

pub use rest::{MetaServiceError, RestSaveRequest, RestSaveService};

use crate::core::{MetaError, ValidationErrors};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

#[derive(Debug)]
pub enum WebError {
    Meta(MetaError),
    Input(String),
    NotFound(String),
    Conflict(String),
    Validation(ValidationErrors),
    Internal(String),
}

impl From<MetaError> for WebError {
    fn from(err: MetaError) -> Self {
        WebError::Meta(err)
    }
}

impl From<MetaServiceError> for WebError {
    fn from(err: MetaServiceError) -> Self {
        match err {
            MetaServiceError::BadRequest(message) => Self::Input(message),
            MetaServiceError::NotFound(message) => Self::NotFound(message),
            MetaServiceError::Conflict(message) => Self::Conflict(message),
            MetaServiceError::Validation(errors) => Self::Validation(errors),
            MetaServiceError::Internal(message) => Self::Internal(message),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let mut fields = None;
        let (status, message, code) = match self {
            WebError::Meta(MetaError::ConstraintViolation(msg)) => {
                (StatusCode::CONFLICT, msg, "conflict")
            }
            WebError::Meta(MetaError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg, "not_found"),
            WebError::Meta(MetaError::AccessDenied(msg)) => {
                (StatusCode::FORBIDDEN, msg, "access_denied")
            }
            WebError::Meta(MetaError::Serialization(msg)) => {
                (StatusCode::BAD_REQUEST, msg, "bad_request")
            }
            WebError::Meta(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                "storage_error",
            ),

            WebError::Input(msg) => (StatusCode::BAD_REQUEST, msg, "bad_request"),
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "not_found"),
            WebError::Conflict(msg) => (StatusCode::CONFLICT, msg, "conflict"),
            WebError::Validation(errors) => {
                let message = errors.to_string();
                fields = Some(errors);
                (StatusCode::UNPROCESSABLE_ENTITY, message, "validation_error")
            }
            WebError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, "internal_error"),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
            fields,
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;

/// `POST /` saves one attribute and answers with the stored row.
pub fn router(service: Arc<RestSaveService>) -> Router {
    Router::new()
        .route("/", post(save_attribute))
        .with_state(service)
}

async fn save_attribute(
    State(service): State<Arc<RestSaveService>>,
    Json(request): Json<RestSaveRequest>,
) -> Result<Json<JsonValue>> {
    let record = service.save(request).await?;
    Ok(Json(record.to_json()))
}
