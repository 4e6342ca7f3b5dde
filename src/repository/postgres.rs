//! PostgreSQL store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    CatalogEntry, CollectionQuery, CollectionSortField, CustomerQuery, CustomerSortField, OrderQuery, Paged,
    ProductQuery, ProductSortField, RepositoryError, RepositoryResult, StoreRepository,
};
use crate::domain::{
    Cart, CartItem, CartItemUpsert, Collection, Customer, CustomerSummary, Membership, NewCollection, NewProduct,
    NewReview, Order,
    OrderSummary, PaymentStatus, Price, Product, ProductRef, Quantity, Review, Slug,
};

const PRODUCT_COLUMNS: &str = "p.id, p.title, p.slug, p.description, p.price, p.inventory, p.last_update, p.collection_id";

const CUSTOMER_SUMMARY_SELECT: &str = "SELECT c.id, c.first_name, c.last_name, c.email, c.phone, c.birth_date, \
     c.membership, COUNT(o.id) AS orders_count FROM customers c LEFT JOIN orders o ON o.customer_id = c.id";

const ORDER_SUMMARY_SELECT: &str = "SELECT o.id, o.placed_at, o.payment_status, o.customer_id, \
     c.first_name AS customer_first_name, c.last_name AS customer_last_name \
     FROM orders o JOIN customers c ON c.id = o.customer_id";

const COLLECTION_SELECT: &str = "SELECT c.id, c.title, c.featured_product_id, COUNT(p.id) AS products_count \
     FROM collections c LEFT JOIN products p ON p.collection_id = c.id";

const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Merged cart lines stop growing at the `INTEGER` column maximum.
const QUANTITY_CEILING: i64 = i32::MAX as i64;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    title: String,
    slug: String,
    description: String,
    price: Decimal,
    inventory: i32,
    last_update: DateTime<Utc>,
    collection_id: i64,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            slug: Slug::from_stored(r.slug),
            description: r.description,
            price: Price::from_stored(r.price),
            inventory: r.inventory,
            last_update: r.last_update,
            collection_id: r.collection_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CatalogRow {
    #[sqlx(flatten)]
    product: ProductRow,
    collection_title: String,
}

impl From<CatalogRow> for CatalogEntry {
    fn from(r: CatalogRow) -> Self {
        Self { product: r.product.into(), collection_title: r.collection_title }
    }
}

#[derive(sqlx::FromRow)]
struct CollectionRow { id: i64, title: String, featured_product_id: Option<i64>, products_count: i64 }

impl From<CollectionRow> for Collection {
    fn from(r: CollectionRow) -> Self {
        Self { id: r.id, title: r.title, featured_product_id: r.featured_product_id, products_count: r.products_count }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow { id: i64, product_id: i64, date: NaiveDate, name: String, description: String }

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Self { id: r.id, product_id: r.product_id, date: r.date, name: r.name, description: r.description }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow { id: i64, quantity: i32, product_id: i64, product_title: String, product_price: Decimal }

impl From<CartItemRow> for CartItem {
    fn from(r: CartItemRow) -> Self {
        Self {
            id: r.id,
            product: ProductRef { id: r.product_id, title: r.product_title, price: Price::from_stored(r.product_price) },
            quantity: Quantity::from_stored(u32::try_from(r.quantity).unwrap_or(1)),
        }
    }
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    inserted: bool,
}

#[derive(sqlx::FromRow)]
struct CustomerSummaryRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    birth_date: Option<NaiveDate>,
    membership: String,
    orders_count: i64,
}

impl TryFrom<CustomerSummaryRow> for CustomerSummary {
    type Error = RepositoryError;
    fn try_from(r: CustomerSummaryRow) -> Result<Self, Self::Error> {
        let membership = Membership::from_code(&r.membership)
            .ok_or(RepositoryError::Corrupt { column: "customers.membership", value: r.membership.clone() })?;
        Ok(Self {
            customer: Customer {
                id: r.id,
                first_name: r.first_name,
                last_name: r.last_name,
                email: r.email,
                phone: r.phone,
                birth_date: r.birth_date,
                membership,
            },
            orders_count: r.orders_count,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    id: i64,
    placed_at: DateTime<Utc>,
    payment_status: String,
    customer_id: i64,
    customer_first_name: String,
    customer_last_name: String,
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = RepositoryError;
    fn try_from(r: OrderSummaryRow) -> Result<Self, Self::Error> {
        let payment_status = PaymentStatus::from_code(&r.payment_status)
            .ok_or(RepositoryError::Corrupt { column: "orders.payment_status", value: r.payment_status.clone() })?;
        Ok(Self {
            order: Order { id: r.id, placed_at: r.placed_at, payment_status, customer_id: r.customer_id },
            customer_first_name: r.customer_first_name,
            customer_last_name: r.customer_last_name,
        })
    }
}

/// Maps a foreign-key violation onto [`RepositoryError::MissingReference`],
/// choosing the entity by the violated constraint's name.
fn missing_reference(candidates: &'static [(&'static str, &'static str)]) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |err| {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                let constraint = db.constraint().unwrap_or_default();
                let entity = candidates
                    .iter()
                    .find(|(name, _)| *name == constraint)
                    .or(candidates.first())
                    .map_or("record", |(_, entity)| *entity);
                return RepositoryError::MissingReference { entity };
            }
        }
        RepositoryError::Database(err)
    }
}

fn protected(entity: &'static str, id: i64, referenced_by: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |err| {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                return RepositoryError::Protected { entity, id, referenced_by };
            }
        }
        RepositoryError::Database(err)
    }
}

/// Escapes `LIKE` metacharacters so user input matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn product_sort_column(field: ProductSortField) -> &'static str {
    match field {
        ProductSortField::Id => "p.id",
        ProductSortField::Title => "p.title",
        ProductSortField::Price => "p.price",
        ProductSortField::Inventory => "p.inventory",
        ProductSortField::LastUpdate => "p.last_update",
    }
}

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    qb.push(" WHERE TRUE");
    if let Some(collection_id) = query.collection_id {
        qb.push(" AND p.collection_id = ").push_bind(collection_id);
    }
    if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (p.title ILIKE ").push_bind(pattern.clone()).push(" OR p.description ILIKE ").push_bind(pattern).push(")");
    }
    if let Some(since) = query.updated_since {
        qb.push(" AND p.last_update >= ").push_bind(since);
    }
}

fn push_customer_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &CustomerQuery) {
    if let Some(prefix) = query.name_prefix.as_deref().filter(|p| !p.is_empty()) {
        let pattern = format!("{}%", escape_like(prefix));
        qb.push(" WHERE (c.first_name ILIKE ").push_bind(pattern.clone()).push(" OR c.last_name ILIKE ").push_bind(pattern).push(")");
    }
}

pub struct PostgresRepository {
    db: PgPool,
}

impl PostgresRepository {
    pub fn new(db: PgPool) -> Self { Self { db } }

    async fn customer_summary(&self, id: i64) -> RepositoryResult<Option<CustomerSummary>> {
        let row = sqlx::query_as::<_, CustomerSummaryRow>(&format!("{CUSTOMER_SUMMARY_SELECT} WHERE c.id = $1 GROUP BY c.id"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(CustomerSummary::try_from).transpose()
    }

    async fn order_summary(&self, id: i64) -> RepositoryResult<Option<OrderSummary>> {
        let row = sqlx::query_as::<_, OrderSummaryRow>(&format!("{ORDER_SUMMARY_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(OrderSummary::try_from).transpose()
    }

    async fn cart_items(&self, cart_id: Uuid) -> RepositoryResult<Vec<CartItem>> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT ci.id, ci.quantity, p.id AS product_id, p.title AS product_title, p.price AS product_price \
             FROM cart_items ci JOIN products p ON p.id = ci.product_id WHERE ci.cart_id = $1 ORDER BY ci.id",
        )
        .bind(cart_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(CartItem::from).collect())
    }
}

#[async_trait]
impl StoreRepository for PostgresRepository {
    async fn list_products(&self, query: &ProductQuery) -> RepositoryResult<Paged<CatalogEntry>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS}, c.title AS collection_title FROM products p JOIN collections c ON c.id = p.collection_id"
        ));
        push_product_filters(&mut qb, query);
        qb.push(format!(" ORDER BY {} {}, p.id ASC", product_sort_column(query.sort.field), query.sort.direction()));
        qb.push(" LIMIT ").push_bind(query.page.limit()).push(" OFFSET ").push_bind(query.page.offset());
        let rows = qb.build_query_as::<CatalogRow>().fetch_all(&self.db).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_product_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        Ok(Paged { items: rows.into_iter().map(CatalogEntry::from).collect(), total })
    }

    async fn get_product(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn product_exists(&self, id: i64) -> RepositoryResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }

    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (title, slug, description, price, inventory, collection_id, last_update) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING id, title, slug, description, price, inventory, last_update, collection_id",
        )
        .bind(&product.title)
        .bind(product.slug.as_str())
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.inventory)
        .bind(product.collection_id)
        .fetch_one(&self.db)
        .await
        .map_err(missing_reference(&[("products_collection_fk", "collection")]))?;
        Ok(row.into())
    }

    async fn update_product(&self, id: i64, product: NewProduct) -> RepositoryResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET title = $2, slug = $3, description = $4, price = $5, inventory = $6, \
             collection_id = $7, last_update = NOW() WHERE id = $1 \
             RETURNING id, title, slug, description, price, inventory, last_update, collection_id",
        )
        .bind(id)
        .bind(&product.title)
        .bind(product.slug.as_str())
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.inventory)
        .bind(product.collection_id)
        .fetch_optional(&self.db)
        .await
        .map_err(missing_reference(&[("products_collection_fk", "collection")]))?;
        Ok(row.map(Product::from))
    }

    async fn update_product_price(&self, id: i64, price: Price) -> RepositoryResult<Option<CatalogEntry>> {
        let row = sqlx::query_as::<_, CatalogRow>(&format!(
            "WITH p AS (UPDATE products SET price = $2, last_update = NOW() WHERE id = $1 RETURNING *) \
             SELECT {PRODUCT_COLUMNS}, c.title AS collection_title FROM p JOIN collections c ON c.id = p.collection_id"
        ))
        .bind(id)
        .bind(price.amount())
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(CatalogEntry::from))
    }

    async fn delete_product(&self, id: i64) -> RepositoryResult<bool> {
        let referenced = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM order_items WHERE product_id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        if referenced {
            return Err(RepositoryError::Protected { entity: "product", id, referenced_by: "order items" });
        }
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(protected("product", id, "order items"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn ordered_products(&self) -> RepositoryResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.id IN (SELECT DISTINCT product_id FROM order_items) ORDER BY p.title, p.id"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_collections(&self, query: &CollectionQuery) -> RepositoryResult<Paged<Collection>> {
        let column = match query.sort.field {
            CollectionSortField::Id => "c.id",
            CollectionSortField::Title => "c.title",
            CollectionSortField::ProductsCount => "products_count",
        };
        let mut qb = QueryBuilder::<Postgres>::new(COLLECTION_SELECT);
        qb.push(format!(" GROUP BY c.id ORDER BY {column} {}, c.id ASC", query.sort.direction()));
        if let Some(page) = query.page {
            qb.push(" LIMIT ").push_bind(page.limit()).push(" OFFSET ").push_bind(page.offset());
        }
        let rows = qb.build_query_as::<CollectionRow>().fetch_all(&self.db).await?;
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM collections").fetch_one(&self.db).await?;
        Ok(Paged { items: rows.into_iter().map(Collection::from).collect(), total })
    }

    async fn get_collection(&self, id: i64) -> RepositoryResult<Option<Collection>> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!("{COLLECTION_SELECT} WHERE c.id = $1 GROUP BY c.id"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Collection::from))
    }

    async fn create_collection(&self, collection: NewCollection) -> RepositoryResult<Collection> {
        let row = sqlx::query_as::<_, CollectionRow>(
            "INSERT INTO collections (title, featured_product_id) VALUES ($1, $2) \
             RETURNING id, title, featured_product_id, 0::BIGINT AS products_count",
        )
        .bind(collection.title)
        .bind(collection.featured_product_id)
        .fetch_one(&self.db)
        .await
        .map_err(missing_reference(&[("collections_featured_product_fk", "product")]))?;
        Ok(row.into())
    }

    async fn update_collection(&self, id: i64, collection: NewCollection) -> RepositoryResult<Option<Collection>> {
        let updated = sqlx::query("UPDATE collections SET title = $2, featured_product_id = $3 WHERE id = $1")
            .bind(id)
            .bind(collection.title)
            .bind(collection.featured_product_id)
            .execute(&self.db)
            .await
            .map_err(missing_reference(&[("collections_featured_product_fk", "product")]))?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_collection(id).await
    }

    async fn delete_collection(&self, id: i64) -> RepositoryResult<bool> {
        let referenced = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE collection_id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        if referenced {
            return Err(RepositoryError::Protected { entity: "collection", id, referenced_by: "products" });
        }
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(protected("collection", id, "products"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_reviews(&self, product_id: i64) -> RepositoryResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, product_id, date, name, description FROM reviews WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn get_review(&self, product_id: i64, id: i64) -> RepositoryResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, product_id, date, name, description FROM reviews WHERE product_id = $1 AND id = $2",
        )
        .bind(product_id)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Review::from))
    }

    async fn create_review(&self, product_id: i64, review: NewReview) -> RepositoryResult<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "INSERT INTO reviews (product_id, name, description, date) VALUES ($1, $2, $3, CURRENT_DATE) \
             RETURNING id, product_id, date, name, description",
        )
        .bind(product_id)
        .bind(review.name)
        .bind(review.description)
        .fetch_one(&self.db)
        .await
        .map_err(missing_reference(&[("reviews_product_fk", "product")]))?;
        Ok(row.into())
    }

    async fn update_review(&self, product_id: i64, id: i64, review: NewReview) -> RepositoryResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "UPDATE reviews SET name = $3, description = $4 WHERE product_id = $1 AND id = $2 \
             RETURNING id, product_id, date, name, description",
        )
        .bind(product_id)
        .bind(id)
        .bind(review.name)
        .bind(review.description)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Review::from))
    }

    async fn delete_review(&self, product_id: i64, id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE product_id = $1 AND id = $2")
            .bind(product_id)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_cart(&self) -> RepositoryResult<Cart> {
        let cart = Cart::new();
        sqlx::query("INSERT INTO carts (id, created_at) VALUES ($1, $2)")
            .bind(cart.id())
            .bind(cart.created_at())
            .execute(&self.db)
            .await?;
        Ok(cart)
    }

    async fn get_cart(&self, id: Uuid) -> RepositoryResult<Option<Cart>> {
        let row = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>("SELECT id, created_at FROM carts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        let Some((id, created_at)) = row else { return Ok(None) };
        let items = self.cart_items(id).await?;
        Ok(Some(Cart::from_parts(id, created_at, items)))
    }

    async fn delete_cart(&self, id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_cart_item(&self, cart_id: Uuid, product_id: i64, quantity: Quantity) -> RepositoryResult<CartItemUpsert> {
        // Single statement: concurrent adds for the same (cart, product) serialize on the unique key.
        let row = sqlx::query_as::<_, UpsertRow>(
            "WITH ci AS ( \
                 INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3) \
                 ON CONFLICT (cart_id, product_id) \
                 DO UPDATE SET quantity = LEAST(cart_items.quantity::BIGINT + EXCLUDED.quantity, $4) \
                 RETURNING id, product_id, quantity, (xmax = 0) AS inserted) \
             SELECT ci.id, ci.quantity, ci.inserted, p.id AS product_id, p.title AS product_title, p.price AS product_price \
             FROM ci JOIN products p ON p.id = ci.product_id",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(i32::try_from(quantity.value()).unwrap_or(i32::MAX))
        .bind(QUANTITY_CEILING)
        .fetch_one(&self.db)
        .await
        .map_err(missing_reference(&[("cart_items_product_fk", "product"), ("cart_items_cart_fk", "cart")]))?;
        Ok(CartItemUpsert { item: row.item.into(), merged: !row.inserted })
    }

    async fn set_cart_item_quantity(&self, cart_id: Uuid, item_id: i64, quantity: Quantity) -> RepositoryResult<Option<CartItem>> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "WITH ci AS (UPDATE cart_items SET quantity = $3 WHERE cart_id = $1 AND id = $2 RETURNING id, product_id, quantity) \
             SELECT ci.id, ci.quantity, p.id AS product_id, p.title AS product_title, p.price AS product_price \
             FROM ci JOIN products p ON p.id = ci.product_id",
        )
        .bind(cart_id)
        .bind(item_id)
        .bind(i32::try_from(quantity.value()).unwrap_or(i32::MAX))
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(CartItem::from))
    }

    async fn delete_cart_item(&self, cart_id: Uuid, item_id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND id = $2")
            .bind(cart_id)
            .bind(item_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_customers(&self, query: &CustomerQuery) -> RepositoryResult<Paged<CustomerSummary>> {
        let direction = query.sort.direction();
        let order_by = match query.sort.field {
            CustomerSortField::Name => format!("c.first_name {direction}, c.last_name {direction}"),
            CustomerSortField::OrdersCount => format!("orders_count {direction}"),
        };
        let mut qb = QueryBuilder::<Postgres>::new(CUSTOMER_SUMMARY_SELECT);
        push_customer_filters(&mut qb, query);
        qb.push(format!(" GROUP BY c.id ORDER BY {order_by}, c.id ASC"));
        qb.push(" LIMIT ").push_bind(query.page.limit()).push(" OFFSET ").push_bind(query.page.offset());
        let rows = qb.build_query_as::<CustomerSummaryRow>().fetch_all(&self.db).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customers c");
        push_customer_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let items = rows.into_iter().map(CustomerSummary::try_from).collect::<RepositoryResult<Vec<_>>>()?;
        Ok(Paged { items, total })
    }

    async fn update_customer_membership(&self, id: i64, membership: Membership) -> RepositoryResult<Option<CustomerSummary>> {
        let updated = sqlx::query("UPDATE customers SET membership = $2 WHERE id = $1")
            .bind(id)
            .bind(membership.code())
            .execute(&self.db)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.customer_summary(id).await
    }

    async fn list_orders(&self, query: &OrderQuery) -> RepositoryResult<Paged<OrderSummary>> {
        let mut qb = QueryBuilder::<Postgres>::new(ORDER_SUMMARY_SELECT);
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders o");
        if let Some(customer_id) = query.customer_id {
            qb.push(" WHERE o.customer_id = ").push_bind(customer_id);
            count.push(" WHERE o.customer_id = ").push_bind(customer_id);
        }
        qb.push(" ORDER BY o.placed_at ASC, o.id ASC LIMIT ").push_bind(query.page.limit()).push(" OFFSET ").push_bind(query.page.offset());
        let rows = qb.build_query_as::<OrderSummaryRow>().fetch_all(&self.db).await?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;
        let items = rows.into_iter().map(OrderSummary::try_from).collect::<RepositoryResult<Vec<_>>>()?;
        Ok(Paged { items, total })
    }

    async fn update_order_payment_status(&self, id: i64, status: PaymentStatus) -> RepositoryResult<Option<OrderSummary>> {
        let updated = sqlx::query("UPDATE orders SET payment_status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.code())
            .execute(&self.db)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.order_summary(id).await
    }
}
