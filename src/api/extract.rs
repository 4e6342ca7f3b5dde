//! Request body extractor whose rejections render as [`ApiError`].

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON request body. Deserialization failures become 400 field maps
/// instead of axum's plain-text 422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
