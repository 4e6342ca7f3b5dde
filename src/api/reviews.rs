//! Reviews, nested under a product.

use axum::{extract::{Path, State}, http::StatusCode, Json};
use tracing::info;
use validator::Validate;

use super::dto::{ReviewRequest, ReviewResponse};
use super::extract::JsonBody;
use crate::domain::DomainEvent;
use crate::error::{ApiError, ApiResult};
use crate::repository::RepositoryError;
use crate::AppState;

async fn require_product(state: &AppState, product_id: i64) -> ApiResult<()> {
    if state.repo.product_exists(product_id).await? { Ok(()) } else { Err(ApiError::NotFound) }
}

pub async fn list_reviews(State(state): State<AppState>, Path(product_id): Path<i64>) -> ApiResult<Json<Vec<ReviewResponse>>> {
    require_product(&state, product_id).await?;
    let reviews = state.repo.list_reviews(product_id).await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

pub async fn get_review(State(state): State<AppState>, Path((product_id, id)): Path<(i64, i64)>) -> ApiResult<Json<ReviewResponse>> {
    let review = state.repo.get_review(product_id, id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(review.into()))
}

pub async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    JsonBody(payload): JsonBody<ReviewRequest>,
) -> ApiResult<(StatusCode, Json<ReviewResponse>)> {
    payload.validate()?;
    require_product(&state, product_id).await?;
    let review = match state.repo.create_review(product_id, payload.into()).await {
        Ok(review) => review,
        Err(RepositoryError::MissingReference { .. }) => return Err(ApiError::NotFound),
        Err(e) => return Err(e.into()),
    };
    info!(product_id, review_id = review.id, "review posted");
    state.events.publish(DomainEvent::ReviewPosted { product_id, review_id: review.id }).await;
    Ok((StatusCode::CREATED, Json(review.into())))
}

pub async fn update_review(
    State(state): State<AppState>,
    Path((product_id, id)): Path<(i64, i64)>,
    JsonBody(payload): JsonBody<ReviewRequest>,
) -> ApiResult<Json<ReviewResponse>> {
    payload.validate()?;
    let review = state.repo.update_review(product_id, id, payload.into()).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(review.into()))
}

pub async fn delete_review(State(state): State<AppState>, Path((product_id, id)): Path<(i64, i64)>) -> ApiResult<StatusCode> {
    if state.repo.delete_review(product_id, id).await? { Ok(StatusCode::NO_CONTENT) } else { Err(ApiError::NotFound) }
}
