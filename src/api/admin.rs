//! Admin changelists: list pages with computed columns, filters, search,
//! sorting and the one inline-editable field of each model.

use axum::{extract::{Path, Query, State}, Json};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extract::JsonBody;
use super::pagination::{PaginatedResponse, PAGE_SIZE};
use crate::domain::{
    Collection, CustomerSummary, DomainEvent, InventoryStatus, Membership, OrderSummary, PaymentStatus, Price,
};
use crate::error::{ApiError, ApiResult};
use crate::repository::{
    CatalogEntry, CollectionQuery, CollectionSortField, CustomerQuery, CustomerSortField, OrderQuery, PageRequest,
    ProductQuery, ProductSortField, Sort,
};
use crate::{AppState, Links};

/// Collections page at a larger size than the other changelists.
const COLLECTION_PAGE_SIZE: u32 = 100;

/// Date-hierarchy filter on a product's last update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum LastUpdateFilter {
    #[serde(rename = "today")] Today,
    #[serde(rename = "past_7_days")] Past7Days,
    #[serde(rename = "this_month")] ThisMonth,
    #[serde(rename = "this_year")] ThisYear,
}

impl LastUpdateFilter {
    /// Inclusive lower bound, in UTC, for rows matching this filter at `now`.
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive();
        let start = match self {
            Self::Today => Some(today),
            Self::Past7Days => Some(today - Duration::days(7)),
            Self::ThisMonth => today.with_day(1),
            Self::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1),
        };
        start
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|midnight| Utc.from_utc_datetime(&midnight))
            .unwrap_or(now)
    }
}

// ── Product ──

#[derive(Debug, Deserialize)]
pub struct ProductChangelistParams {
    pub page: Option<u32>,
    pub ordering: Option<String>,
    pub collection_id: Option<i64>,
    pub last_update: Option<LastUpdateFilter>,
}

#[derive(Debug, Serialize)]
pub struct ProductRow {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub inventory_status: InventoryStatus,
    pub collection_title: String,
}

impl From<CatalogEntry> for ProductRow {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.product.id,
            inventory_status: entry.product.inventory_status(),
            title: entry.product.title,
            price: entry.product.price.amount(),
            collection_title: entry.collection_title,
        }
    }
}

// `inventory_status` sorts by the inventory it is computed from.
const PRODUCT_ORDERING: [(&str, ProductSortField); 4] = [
    ("title", ProductSortField::Title),
    ("price", ProductSortField::Price),
    ("inventory", ProductSortField::Inventory),
    ("inventory_status", ProductSortField::Inventory),
];

pub async fn product_changelist(
    State(state): State<AppState>,
    Query(params): Query<ProductChangelistParams>,
) -> ApiResult<Json<PaginatedResponse<ProductRow>>> {
    let page = PageRequest::new(params.page, PAGE_SIZE);
    let query = ProductQuery {
        collection_id: params.collection_id,
        search: None,
        updated_since: params.last_update.map(|f| f.since(Utc::now())),
        sort: params
            .ordering
            .as_deref()
            .and_then(|raw| Sort::parse(raw, &PRODUCT_ORDERING))
            .unwrap_or(Sort::asc(ProductSortField::Title)),
        page,
    };
    let rows = state.repo.list_products(&query).await?;
    Ok(Json(PaginatedResponse::from_page(rows, page, ProductRow::from)))
}

#[derive(Debug, Deserialize)]
pub struct ProductEdit {
    pub price: Decimal,
}

pub async fn edit_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(edit): JsonBody<ProductEdit>,
) -> ApiResult<Json<ProductRow>> {
    let price = Price::new(edit.price).map_err(|e| ApiError::field("price", e.to_string()))?;
    let entry = state.repo.update_product_price(id, price).await?.ok_or(ApiError::NotFound)?;
    info!(product_id = id, %price, "product price edited");
    state.events.publish(DomainEvent::ProductPriceChanged { product_id: id, price: price.amount() }).await;
    Ok(Json(entry.into()))
}

// ── Customer ──

#[derive(Debug, Deserialize)]
pub struct CustomerChangelistParams {
    pub page: Option<u32>,
    pub ordering: Option<String>,
    /// Case-insensitive prefix of the first or last name.
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub membership: Membership,
    pub orders_count: i64,
    /// Order changelist filtered to this customer.
    pub orders_link: String,
}

impl CustomerRow {
    fn new(summary: CustomerSummary, links: &Links) -> Self {
        let c = summary.customer;
        Self {
            orders_link: links.admin_orders_for_customer(c.id),
            id: c.id,
            first_name: c.first_name,
            last_name: c.last_name,
            membership: c.membership,
            orders_count: summary.orders_count,
        }
    }
}

const CUSTOMER_ORDERING: [(&str, CustomerSortField); 2] =
    [("name", CustomerSortField::Name), ("orders_count", CustomerSortField::OrdersCount)];

pub async fn customer_changelist(
    State(state): State<AppState>,
    Query(params): Query<CustomerChangelistParams>,
) -> ApiResult<Json<PaginatedResponse<CustomerRow>>> {
    let page = PageRequest::new(params.page, PAGE_SIZE);
    let query = CustomerQuery {
        name_prefix: params.q.filter(|q| !q.trim().is_empty()),
        sort: params
            .ordering
            .as_deref()
            .and_then(|raw| Sort::parse(raw, &CUSTOMER_ORDERING))
            .unwrap_or(Sort::asc(CustomerSortField::Name)),
        page,
    };
    let rows = state.repo.list_customers(&query).await?;
    Ok(Json(PaginatedResponse::from_page(rows, page, |s| CustomerRow::new(s, &state.links))))
}

#[derive(Debug, Deserialize)]
pub struct CustomerEdit {
    pub membership: Membership,
}

pub async fn edit_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(edit): JsonBody<CustomerEdit>,
) -> ApiResult<Json<CustomerRow>> {
    let summary = state.repo.update_customer_membership(id, edit.membership).await?.ok_or(ApiError::NotFound)?;
    info!(customer_id = id, membership = edit.membership.code(), "customer membership edited");
    state
        .events
        .publish(DomainEvent::CustomerMembershipChanged { customer_id: id, membership: edit.membership })
        .await;
    Ok(Json(CustomerRow::new(summary, &state.links)))
}

// ── Order ──

#[derive(Debug, Deserialize)]
pub struct OrderChangelistParams {
    pub page: Option<u32>,
    pub customer_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderRow {
    pub id: i64,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub payment_status: PaymentStatus,
    pub placed_at: DateTime<Utc>,
}

impl From<OrderSummary> for OrderRow {
    fn from(s: OrderSummary) -> Self {
        Self {
            id: s.order.id,
            customer_first_name: s.customer_first_name,
            customer_last_name: s.customer_last_name,
            payment_status: s.order.payment_status,
            placed_at: s.order.placed_at,
        }
    }
}

pub async fn order_changelist(
    State(state): State<AppState>,
    Query(params): Query<OrderChangelistParams>,
) -> ApiResult<Json<PaginatedResponse<OrderRow>>> {
    let page = PageRequest::new(params.page, PAGE_SIZE);
    let rows = state.repo.list_orders(&OrderQuery { customer_id: params.customer_id, page }).await?;
    Ok(Json(PaginatedResponse::from_page(rows, page, OrderRow::from)))
}

#[derive(Debug, Deserialize)]
pub struct OrderEdit {
    pub payment_status: PaymentStatus,
}

pub async fn edit_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(edit): JsonBody<OrderEdit>,
) -> ApiResult<Json<OrderRow>> {
    let summary = state.repo.update_order_payment_status(id, edit.payment_status).await?.ok_or(ApiError::NotFound)?;
    info!(order_id = id, payment_status = edit.payment_status.code(), "order payment status edited");
    state
        .events
        .publish(DomainEvent::OrderPaymentStatusChanged { order_id: id, payment_status: edit.payment_status })
        .await;
    Ok(Json(summary.into()))
}

// ── Collection ──

#[derive(Debug, Deserialize)]
pub struct CollectionChangelistParams {
    pub page: Option<u32>,
    pub ordering: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CollectionRow {
    pub id: i64,
    pub title: String,
    pub featured_product_id: Option<i64>,
    pub products_count: i64,
    /// Product changelist filtered to this collection.
    pub products_link: String,
}

impl CollectionRow {
    fn new(c: Collection, links: &Links) -> Self {
        Self {
            products_link: links.admin_products_for_collection(c.id),
            id: c.id,
            title: c.title,
            featured_product_id: c.featured_product_id,
            products_count: c.products_count,
        }
    }
}

const COLLECTION_ORDERING: [(&str, CollectionSortField); 2] =
    [("title", CollectionSortField::Title), ("products_count", CollectionSortField::ProductsCount)];

pub async fn collection_changelist(
    State(state): State<AppState>,
    Query(params): Query<CollectionChangelistParams>,
) -> ApiResult<Json<PaginatedResponse<CollectionRow>>> {
    let page = PageRequest::new(params.page, COLLECTION_PAGE_SIZE);
    let query = CollectionQuery {
        sort: params
            .ordering
            .as_deref()
            .and_then(|raw| Sort::parse(raw, &COLLECTION_ORDERING))
            .unwrap_or(Sort::asc(CollectionSortField::Id)),
        page: Some(page),
    };
    let rows = state.repo.list_collections(&query).await?;
    Ok(Json(PaginatedResponse::from_page(rows, page, |c| CollectionRow::new(c, &state.links))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_update_filter_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 15, 30, 0).unwrap();
        assert_eq!(LastUpdateFilter::Today.since(now), Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap());
        assert_eq!(LastUpdateFilter::Past7Days.since(now), Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap());
        assert_eq!(LastUpdateFilter::ThisMonth.since(now), Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(LastUpdateFilter::ThisYear.since(now), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_last_update_filter_parses_query_values() {
        let f: LastUpdateFilter = serde_json::from_str("\"past_7_days\"").unwrap();
        assert_eq!(f, LastUpdateFilter::Past7Days);
    }
}
