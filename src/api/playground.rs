//! Scratch query page.

use axum::{extract::State, Json};
use serde::Serialize;

use super::dto::SimpleProduct;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HelloResponse {
    pub products: Vec<SimpleProduct>,
}

/// Products that have been ordered at least once, by title.
pub async fn hello(State(state): State<AppState>) -> ApiResult<Json<HelloResponse>> {
    let products = state.repo.ordered_products().await?;
    Ok(Json(HelloResponse { products: products.iter().map(SimpleProduct::from).collect() }))
}
