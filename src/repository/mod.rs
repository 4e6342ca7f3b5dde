//! Storage seam for the storefront.
//!
//! [`StoreRepository`] is implemented by [`PostgresRepository`] for
//! production and by [`MemoryRepository`] for tests and database-less runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Cart, CartItem, CartItemUpsert, Collection, CustomerSummary, Membership, NewCollection, NewProduct, NewReview,
    OrderSummary, PaymentStatus, Price, Product, Quantity, Review,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A delete was refused because other rows still point at the record.
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    Protected { entity: &'static str, id: i64, referenced_by: &'static str },

    /// A write named a parent record that does not exist.
    #[error("referenced {entity} does not exist")]
    MissingReference { entity: &'static str },

    #[error("stored {column} value {value:?} is not recognised")]
    Corrupt { column: &'static str, value: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// One page of rows plus the unpaged total.
#[derive(Clone, Debug, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Paged<T> {
    /// Every row as a single page.
    pub fn all(items: Vec<T>) -> Self {
        let total = items.len() as i64;
        Self { items, total }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, per_page: u32) -> Self {
        Self { page: page.unwrap_or(1).max(1), per_page: per_page.max(1) }
    }

    pub fn offset(&self) -> i64 { i64::from(self.page - 1) * i64::from(self.per_page) }
    pub fn limit(&self) -> i64 { i64::from(self.per_page) }

    /// Applies this page to an already-sorted, in-memory row set.
    pub fn slice<T>(&self, rows: Vec<T>) -> Paged<T> {
        let total = rows.len() as i64;
        let items = rows.into_iter().skip(self.offset() as usize).take(self.per_page as usize).collect();
        Paged { items, total }
    }
}

/// A field name with a direction, parsed from `field` or `-field`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub descending: bool,
}

impl<F> Sort<F> {
    pub fn asc(field: F) -> Self { Self { field, descending: false } }

    /// Parses `raw` against the allowed `(name, field)` pairs.
    pub fn parse(raw: &str, allowed: &[(&str, F)]) -> Option<Self>
    where
        F: Copy,
    {
        let (descending, name) = match raw.strip_prefix('-') { Some(rest) => (true, rest), None => (false, raw) };
        allowed.iter().find(|(n, _)| *n == name).map(|(_, field)| Self { field: *field, descending })
    }

    pub(crate) fn direction(&self) -> &'static str { if self.descending { "DESC" } else { "ASC" } }

    pub(crate) fn apply(&self, ord: std::cmp::Ordering) -> std::cmp::Ordering {
        if self.descending { ord.reverse() } else { ord }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductSortField { Id, Title, Price, Inventory, LastUpdate }

#[derive(Clone, Debug, PartialEq)]
pub struct ProductQuery {
    pub collection_id: Option<i64>,
    pub search: Option<String>,
    pub updated_since: Option<DateTime<Utc>>,
    pub sort: Sort<ProductSortField>,
    pub page: PageRequest,
}

/// A product joined with its collection's title.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub product: Product,
    pub collection_title: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionSortField { Id, Title, ProductsCount }

#[derive(Clone, Debug, PartialEq)]
pub struct CollectionQuery {
    pub sort: Sort<CollectionSortField>,
    /// `None` returns every collection.
    pub page: Option<PageRequest>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CustomerSortField { Name, OrdersCount }

#[derive(Clone, Debug, PartialEq)]
pub struct CustomerQuery {
    pub name_prefix: Option<String>,
    pub sort: Sort<CustomerSortField>,
    pub page: PageRequest,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderQuery {
    pub customer_id: Option<i64>,
    pub page: PageRequest,
}

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn list_products(&self, query: &ProductQuery) -> RepositoryResult<Paged<CatalogEntry>>;
    async fn get_product(&self, id: i64) -> RepositoryResult<Option<Product>>;
    async fn product_exists(&self, id: i64) -> RepositoryResult<bool>;
    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product>;
    async fn update_product(&self, id: i64, product: NewProduct) -> RepositoryResult<Option<Product>>;
    async fn update_product_price(&self, id: i64, price: Price) -> RepositoryResult<Option<CatalogEntry>>;
    /// Fails with [`RepositoryError::Protected`] while order items reference the product.
    async fn delete_product(&self, id: i64) -> RepositoryResult<bool>;
    /// Distinct products that appear on at least one order item, by title.
    async fn ordered_products(&self) -> RepositoryResult<Vec<Product>>;

    async fn list_collections(&self, query: &CollectionQuery) -> RepositoryResult<Paged<Collection>>;
    async fn get_collection(&self, id: i64) -> RepositoryResult<Option<Collection>>;
    /// Fails with [`RepositoryError::MissingReference`] when the featured product does not exist.
    async fn create_collection(&self, collection: NewCollection) -> RepositoryResult<Collection>;
    async fn update_collection(&self, id: i64, collection: NewCollection) -> RepositoryResult<Option<Collection>>;
    /// Fails with [`RepositoryError::Protected`] while products belong to the collection.
    async fn delete_collection(&self, id: i64) -> RepositoryResult<bool>;

    async fn list_reviews(&self, product_id: i64) -> RepositoryResult<Vec<Review>>;
    async fn get_review(&self, product_id: i64, id: i64) -> RepositoryResult<Option<Review>>;
    async fn create_review(&self, product_id: i64, review: NewReview) -> RepositoryResult<Review>;
    async fn update_review(&self, product_id: i64, id: i64, review: NewReview) -> RepositoryResult<Option<Review>>;
    async fn delete_review(&self, product_id: i64, id: i64) -> RepositoryResult<bool>;

    async fn create_cart(&self) -> RepositoryResult<Cart>;
    async fn get_cart(&self, id: Uuid) -> RepositoryResult<Option<Cart>>;
    async fn delete_cart(&self, id: Uuid) -> RepositoryResult<bool>;
    /// Adds to the existing (cart, product) line or creates one, atomically.
    async fn add_cart_item(&self, cart_id: Uuid, product_id: i64, quantity: Quantity) -> RepositoryResult<CartItemUpsert>;
    async fn set_cart_item_quantity(&self, cart_id: Uuid, item_id: i64, quantity: Quantity) -> RepositoryResult<Option<CartItem>>;
    async fn delete_cart_item(&self, cart_id: Uuid, item_id: i64) -> RepositoryResult<bool>;

    async fn list_customers(&self, query: &CustomerQuery) -> RepositoryResult<Paged<CustomerSummary>>;
    async fn update_customer_membership(&self, id: i64, membership: Membership) -> RepositoryResult<Option<CustomerSummary>>;
    async fn list_orders(&self, query: &OrderQuery) -> RepositoryResult<Paged<OrderSummary>>;
    async fn update_order_payment_status(&self, id: i64, status: PaymentStatus) -> RepositoryResult<Option<OrderSummary>>;
}
