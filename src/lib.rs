//! Storefront service
//!
//! Catalog, cart and review REST API plus admin list endpoints for a small
//! online store.
//!
//! ## Features
//! - Product and collection catalog with tax-inclusive prices
//! - Carts with atomic add-or-increment of cart items
//! - Product reviews
//! - Admin changelists with computed columns and inline edits
//! - Optional domain event publishing to NATS

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod publisher;
pub mod repository;

pub use api::router;
pub use config::{Backend, Config, ConfigError};
pub use error::{ApiError, ApiResult};
pub use publisher::EventPublisher;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryError, StoreRepository};

/// Builds absolute URLs for hyperlinked fields.
#[derive(Clone, Debug)]
pub struct Links {
    base: Arc<str>,
}

impl Links {
    pub fn new(base: impl AsRef<str>) -> Self {
        Self { base: Arc::from(base.as_ref().trim_end_matches('/')) }
    }

    pub fn collection(&self, id: i64) -> String { format!("{}/store/collections/{id}", self.base) }

    /// Resolves a collection hyperlink back to its id. Accepts absolute URLs
    /// on any host as well as bare paths; the path must be exactly
    /// `/store/collections/{id}`, optionally with a trailing slash.
    pub fn parse_collection(&self, link: &str) -> Option<i64> {
        let path = match link.split_once("://") {
            Some((_, rest)) => &rest[rest.find('/')?..],
            None => link,
        };
        let id = path.strip_prefix("/store/collections/")?;
        id.strip_suffix('/').unwrap_or(id).parse().ok()
    }

    pub fn admin_orders_for_customer(&self, customer_id: i64) -> String {
        format!("{}/admin/store/order?customer_id={customer_id}", self.base)
    }

    pub fn admin_products_for_collection(&self, collection_id: i64) -> String {
        format!("{}/admin/store/product?collection_id={collection_id}", self.base)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn StoreRepository>,
    pub events: EventPublisher,
    pub links: Links,
}

impl AppState {
    pub fn new(repo: Arc<dyn StoreRepository>, events: EventPublisher, links: Links) -> Self {
        Self { repo, events, links }
    }
}
