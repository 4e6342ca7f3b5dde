//! HTTP surface: the store REST API, admin changelists and the playground page.

use axum::{routing::{get, patch, post}, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub mod admin;
pub mod carts;
pub mod collections;
pub mod dto;
pub mod extract;
pub mod pagination;
pub mod playground;
pub mod products;
pub mod reviews;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .route("/store/products", get(products::list_products).post(products::create_product))
        .route(
            "/store/products/:product_id",
            get(products::get_product).put(products::update_product).delete(products::delete_product),
        )
        .route("/store/products/:product_id/reviews", get(reviews::list_reviews).post(reviews::create_review))
        .route(
            "/store/products/:product_id/reviews/:id",
            get(reviews::get_review).put(reviews::update_review).delete(reviews::delete_review),
        )
        .route("/store/collections", get(collections::list_collections).post(collections::create_collection))
        .route(
            "/store/collections/:id",
            get(collections::get_collection).put(collections::update_collection).delete(collections::delete_collection),
        )
        .route("/store/carts", post(carts::create_cart))
        .route("/store/carts/:cart_id", get(carts::get_cart).delete(carts::delete_cart))
        .route("/store/carts/:cart_id/items", get(carts::list_items).post(carts::add_item))
        .route(
            "/store/carts/:cart_id/items/:id",
            get(carts::get_item).patch(carts::update_item).delete(carts::delete_item),
        )
        .route("/admin/store/product", get(admin::product_changelist))
        .route("/admin/store/product/:id", patch(admin::edit_product))
        .route("/admin/store/customer", get(admin::customer_changelist))
        .route("/admin/store/customer/:id", patch(admin::edit_customer))
        .route("/admin/store/order", get(admin::order_changelist))
        .route("/admin/store/order/:id", patch(admin::edit_order))
        .route("/admin/store/collection", get(admin::collection_changelist))
        .route("/playground/hello", get(playground::hello))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
