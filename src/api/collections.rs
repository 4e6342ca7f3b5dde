//! Collection endpoints.

use axum::{extract::{Path, State}, http::StatusCode, Json};
use tracing::info;
use validator::Validate;

use super::dto::{missing_pk, CollectionRequest, CollectionResponse};
use super::extract::JsonBody;
use crate::error::{ApiError, ApiResult};
use crate::repository::{CollectionQuery, CollectionSortField, RepositoryError, Sort};
use crate::AppState;

const COLLECTION_IN_USE: &str = "Collection cannot be deleted because it includes one or more products.";

fn featured_gone(featured_product_id: Option<i64>) -> impl FnOnce(RepositoryError) -> ApiError {
    move |err| match (err, featured_product_id) {
        (RepositoryError::MissingReference { entity: "product" }, Some(id)) => ApiError::field("featured_product_id", missing_pk(id)),
        (other, _) => other.into(),
    }
}

/// Unpaged: returns every collection.
pub async fn list_collections(State(state): State<AppState>) -> ApiResult<Json<Vec<CollectionResponse>>> {
    let query = CollectionQuery { sort: Sort::asc(CollectionSortField::Id), page: None };
    let collections = state.repo.list_collections(&query).await?;
    Ok(Json(collections.items.into_iter().map(CollectionResponse::from).collect()))
}

pub async fn get_collection(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<CollectionResponse>> {
    let collection = state.repo.get_collection(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(collection.into()))
}

pub async fn create_collection(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CollectionRequest>,
) -> ApiResult<(StatusCode, Json<CollectionResponse>)> {
    payload.validate()?;
    let featured = payload.featured_product_id;
    let collection = state.repo.create_collection(payload.into()).await.map_err(featured_gone(featured))?;
    info!(collection_id = collection.id, "collection created");
    Ok((StatusCode::CREATED, Json(collection.into())))
}

pub async fn update_collection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<CollectionRequest>,
) -> ApiResult<Json<CollectionResponse>> {
    payload.validate()?;
    let featured = payload.featured_product_id;
    let collection = state
        .repo
        .update_collection(id, payload.into())
        .await
        .map_err(featured_gone(featured))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(collection.into()))
}

pub async fn delete_collection(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    match state.repo.delete_collection(id).await {
        Ok(true) => {
            info!(collection_id = id, "collection deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(ApiError::NotFound),
        Err(RepositoryError::Protected { .. }) => Err(ApiError::DeleteRefused(COLLECTION_IN_USE)),
        Err(e) => Err(e.into()),
    }
}
