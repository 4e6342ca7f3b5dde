//! Carts and their items.

use axum::{extract::{Path, State}, http::StatusCode, Json};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::dto::{AddCartItemRequest, AddCartItemResponse, CartItemResponse, CartResponse, UpdateCartItemRequest, NO_SUCH_PRODUCT};
use super::extract::JsonBody;
use crate::domain::{Cart, DomainEvent, Quantity};
use crate::error::{ApiError, ApiResult};
use crate::repository::RepositoryError;
use crate::AppState;

fn quantity(value: u32) -> ApiResult<Quantity> {
    Quantity::new(value).map_err(|e| ApiError::field("quantity", e.to_string()))
}

async fn load_cart(state: &AppState, cart_id: Uuid) -> ApiResult<Cart> {
    state.repo.get_cart(cart_id).await?.ok_or(ApiError::NotFound)
}

pub async fn create_cart(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<CartResponse>)> {
    let cart = state.repo.create_cart().await?;
    debug!(cart_id = %cart.id(), "cart created");
    Ok((StatusCode::CREATED, Json(CartResponse::from(&cart))))
}

pub async fn get_cart(State(state): State<AppState>, Path(cart_id): Path<Uuid>) -> ApiResult<Json<CartResponse>> {
    let cart = load_cart(&state, cart_id).await?;
    Ok(Json(CartResponse::from(&cart)))
}

pub async fn delete_cart(State(state): State<AppState>, Path(cart_id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !state.repo.delete_cart(cart_id).await? {
        return Err(ApiError::NotFound);
    }
    info!(%cart_id, "cart deleted");
    state.events.publish(DomainEvent::CartDeleted { cart_id }).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_items(State(state): State<AppState>, Path(cart_id): Path<Uuid>) -> ApiResult<Json<Vec<CartItemResponse>>> {
    let cart = load_cart(&state, cart_id).await?;
    Ok(Json(cart.items().iter().map(CartItemResponse::from).collect()))
}

pub async fn get_item(State(state): State<AppState>, Path((cart_id, item_id)): Path<(Uuid, i64)>) -> ApiResult<Json<CartItemResponse>> {
    let cart = load_cart(&state, cart_id).await?;
    let item = cart.item(item_id).ok_or(ApiError::NotFound)?;
    Ok(Json(CartItemResponse::from(item)))
}

/// Adds a product to the cart, increasing the quantity of an existing line
/// for the same product instead of creating a second one.
pub async fn add_item(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    JsonBody(payload): JsonBody<AddCartItemRequest>,
) -> ApiResult<(StatusCode, Json<AddCartItemResponse>)> {
    payload.validate()?;
    let quantity = quantity(payload.quantity)?;
    if !state.repo.product_exists(payload.product_id).await? {
        return Err(ApiError::field("product_id", NO_SUCH_PRODUCT));
    }

    let upsert = match state.repo.add_cart_item(cart_id, payload.product_id, quantity).await {
        Ok(upsert) => upsert,
        Err(RepositoryError::MissingReference { entity: "product" }) => return Err(ApiError::field("product_id", NO_SUCH_PRODUCT)),
        Err(RepositoryError::MissingReference { .. }) => return Err(ApiError::NotFound),
        Err(e) => return Err(e.into()),
    };
    info!(
        %cart_id,
        item_id = upsert.item.id,
        product_id = payload.product_id,
        quantity = upsert.item.quantity.value(),
        merged = upsert.merged,
        "cart item saved"
    );
    state
        .events
        .publish(DomainEvent::CartItemAdded {
            cart_id,
            item_id: upsert.item.id,
            product_id: payload.product_id,
            quantity: upsert.item.quantity.value(),
            merged: upsert.merged,
        })
        .await;
    Ok((StatusCode::CREATED, Json(AddCartItemResponse::from(&upsert.item))))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(Uuid, i64)>,
    JsonBody(payload): JsonBody<UpdateCartItemRequest>,
) -> ApiResult<Json<CartItemResponse>> {
    payload.validate()?;
    let quantity = quantity(payload.quantity)?;
    let item = state.repo.set_cart_item_quantity(cart_id, item_id, quantity).await?.ok_or(ApiError::NotFound)?;
    state
        .events
        .publish(DomainEvent::CartItemUpdated { cart_id, item_id, quantity: item.quantity.value() })
        .await;
    Ok(Json(CartItemResponse::from(&item)))
}

pub async fn delete_item(State(state): State<AppState>, Path((cart_id, item_id)): Path<(Uuid, i64)>) -> ApiResult<StatusCode> {
    if !state.repo.delete_cart_item(cart_id, item_id).await? {
        return Err(ApiError::NotFound);
    }
    state.events.publish(DomainEvent::CartItemRemoved { cart_id, item_id }).await;
    Ok(StatusCode::NO_CONTENT)
}
