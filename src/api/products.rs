//! Product catalog endpoints.

use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::dto::{ProductRequest, ProductResponse, HYPERLINK_MISSING_OBJECT, HYPERLINK_NO_MATCH};
use super::extract::JsonBody;
use super::pagination::{PaginatedResponse, PAGE_SIZE};
use crate::error::{ApiError, ApiResult};
use crate::repository::{PageRequest, ProductQuery, ProductSortField, RepositoryError, Sort};
use crate::AppState;

const PRODUCT_IN_USE: &str = "Product cannot be deleted because it is associated with an order item.";

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub collection_id: Option<i64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

const ORDERING_FIELDS: [(&str, ProductSortField); 2] =
    [("price", ProductSortField::Price), ("last_update", ProductSortField::LastUpdate)];

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> ApiResult<Json<PaginatedResponse<ProductResponse>>> {
    let page = PageRequest::new(params.page, PAGE_SIZE);
    let query = ProductQuery {
        collection_id: params.collection_id,
        search: params.search.filter(|s| !s.trim().is_empty()),
        updated_since: None,
        // Unknown ordering fields are ignored.
        sort: params
            .ordering
            .as_deref()
            .and_then(|raw| Sort::parse(raw, &ORDERING_FIELDS))
            .unwrap_or(Sort::asc(ProductSortField::Id)),
        page,
    };
    let products = state.repo.list_products(&query).await?;
    Ok(Json(PaginatedResponse::from_page(products, page, |entry| ProductResponse::new(&entry.product, &state.links))))
}

pub async fn get_product(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<ProductResponse>> {
    let product = state.repo.get_product(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(ProductResponse::new(&product, &state.links)))
}

/// Resolves the `collection` hyperlink of a product payload to an existing collection id.
async fn resolve_collection(state: &AppState, link: &str) -> ApiResult<i64> {
    let id = state.links.parse_collection(link).ok_or_else(|| ApiError::field("collection", HYPERLINK_NO_MATCH))?;
    match state.repo.get_collection(id).await? {
        Some(_) => Ok(id),
        None => Err(ApiError::field("collection", HYPERLINK_MISSING_OBJECT)),
    }
}

fn collection_gone(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::MissingReference { .. } => ApiError::field("collection", HYPERLINK_MISSING_OBJECT),
        other => other.into(),
    }
}

pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    payload.validate()?;
    let collection_id = resolve_collection(&state, &payload.collection).await?;
    let product = state.repo.create_product(payload.into_new_product(collection_id)?).await.map_err(collection_gone)?;
    info!(product_id = product.id, collection_id, "product created");
    Ok((StatusCode::CREATED, Json(ProductResponse::new(&product, &state.links))))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<ProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    payload.validate()?;
    let collection_id = resolve_collection(&state, &payload.collection).await?;
    let product = state
        .repo
        .update_product(id, payload.into_new_product(collection_id)?)
        .await
        .map_err(collection_gone)?
        .ok_or(ApiError::NotFound)?;
    info!(product_id = id, "product updated");
    Ok(Json(ProductResponse::new(&product, &state.links)))
}

pub async fn delete_product(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    match state.repo.delete_product(id).await {
        Ok(true) => {
            info!(product_id = id, "product deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(ApiError::NotFound),
        Err(RepositoryError::Protected { .. }) => Err(ApiError::DeleteRefused(PRODUCT_IN_USE)),
        Err(e) => Err(e.into()),
    }
}
