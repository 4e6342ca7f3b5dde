//! HTTP-facing error type.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::repository::RepositoryError;

/// Field name to messages, the body of a 400 response.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found.")]
    NotFound,

    #[error("invalid input: {0:?}")]
    Validation(FieldErrors),

    /// The body is not JSON at all.
    #[error("{0}")]
    Malformed(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    /// The record exists but may not be deleted in its current state.
    #[error("{0}")]
    DeleteRefused(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| format!("Invalid value ({}).", e.code)))
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self::Validation(fields)
    }
}

/// Field-map form of a serde error, as rendered by axum's JSON extractor:
/// an optional `path: ` prefix followed by serde's message.
fn deserialize_errors(detail: &str) -> FieldErrors {
    let detail = detail.rsplit_once(" at line ").map_or(detail, |(head, _)| head);
    let (path, inner) = match detail.split_once(": ") {
        Some((path, inner)) if !path.contains(' ') => (Some(path), inner),
        _ => (None, detail),
    };

    let mut errors = FieldErrors::new();
    if let Some(missing) = inner.strip_prefix("missing field `").and_then(|rest| rest.strip_suffix('`')) {
        let field = path.map_or_else(|| missing.to_string(), |p| format!("{p}.{missing}"));
        errors.insert(field, vec!["This field is required.".into()]);
        return errors;
    }
    let Some(path) = path else {
        errors.insert("non_field_errors".into(), vec![format!("Invalid data. {inner}")]);
        return errors;
    };
    let message = if let Some(rest) = inner.strip_prefix("unknown variant ") {
        let choice = rest.split(", expected").next().unwrap_or(rest).trim_matches('`');
        format!("\"{choice}\" is not a valid choice.")
    } else if inner.contains("expected u") || inner.contains("expected i") {
        "A valid integer is required.".to_string()
    } else if inner.contains("Decimal") {
        "A valid number is required.".to_string()
    } else if inner.contains("expected a string") {
        "Not a valid string.".to_string()
    } else {
        inner.to_string()
    };
    errors.insert(path.to_string(), vec![message]);
    errors
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let text = err.body_text();
                let detail = text.split_once(": ").map_or(text.as_str(), |(_, detail)| detail);
                Self::Validation(deserialize_errors(detail))
            }
            JsonRejection::MissingJsonContentType(err) => Self::UnsupportedMediaType(err.body_text()),
            other => Self::Malformed(format!("JSON parse error - {}", other.body_text())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
            Self::Validation(fields) => (StatusCode::BAD_REQUEST, Json(fields)).into_response(),
            Self::Malformed(message) => (StatusCode::BAD_REQUEST, Json(json!({"detail": message}))).into_response(),
            Self::UnsupportedMediaType(message) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, Json(json!({"detail": message}))).into_response()
            }
            Self::DeleteRefused(message) => (StatusCode::METHOD_NOT_ALLOWED, Json(json!({"error": message}))).into_response(),
            Self::Repository(err) => {
                tracing::error!(error = %err, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "A server error occurred."}))).into_response()
            }
        }
    }
}
