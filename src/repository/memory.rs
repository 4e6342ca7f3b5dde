//! In-process store backed by ordered maps behind a single async lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    CatalogEntry, CollectionQuery, CollectionSortField, CustomerQuery, CustomerSortField, OrderQuery, Paged,
    ProductQuery, ProductSortField, RepositoryError, RepositoryResult, StoreRepository,
};
use crate::domain::{
    Cart, CartItem, CartItemUpsert, Collection, Customer, CustomerSummary, Membership, NewCollection, NewCustomer,
    NewProduct, NewReview, Order, OrderItem, OrderSummary, PaymentStatus, Price, Product, Quantity, Review,
};

struct StoredCollection {
    title: String,
    featured_product_id: Option<i64>,
}

#[derive(Default)]
struct State {
    collections: BTreeMap<i64, StoredCollection>,
    products: BTreeMap<i64, Product>,
    reviews: BTreeMap<i64, Review>,
    carts: HashMap<Uuid, Cart>,
    customers: BTreeMap<i64, Customer>,
    orders: BTreeMap<i64, Order>,
    order_items: Vec<OrderItem>,
    last_collection_id: i64,
    last_product_id: i64,
    last_review_id: i64,
    last_cart_item_id: i64,
    last_customer_id: i64,
    last_order_id: i64,
    last_order_item_id: i64,
}

fn bump(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl State {
    fn collection(&self, id: i64) -> Option<Collection> {
        let stored = self.collections.get(&id)?;
        let products_count = self.products.values().filter(|p| p.collection_id == id).count() as i64;
        Some(Collection {
            id,
            title: stored.title.clone(),
            featured_product_id: stored.featured_product_id,
            products_count,
        })
    }

    fn catalog_entry(&self, product: &Product) -> CatalogEntry {
        CatalogEntry {
            product: product.clone(),
            collection_title: self.collections.get(&product.collection_id).map(|c| c.title.clone()).unwrap_or_default(),
        }
    }

    fn customer_summary(&self, customer: &Customer) -> CustomerSummary {
        let orders_count = self.orders.values().filter(|o| o.customer_id == customer.id).count() as i64;
        CustomerSummary { customer: customer.clone(), orders_count }
    }

    fn order_summary(&self, order: &Order) -> OrderSummary {
        let (first, last) = self
            .customers
            .get(&order.customer_id)
            .map(|c| (c.first_name.clone(), c.last_name.clone()))
            .unwrap_or_default();
        OrderSummary { order: order.clone(), customer_first_name: first, customer_last_name: last }
    }

    fn require_collection(&self, id: i64) -> RepositoryResult<()> {
        if self.collections.contains_key(&id) { Ok(()) } else { Err(RepositoryError::MissingReference { entity: "collection" }) }
    }

    fn require_featured(&self, product_id: Option<i64>) -> RepositoryResult<()> {
        match product_id {
            Some(id) if !self.products.contains_key(&id) => Err(RepositoryError::MissingReference { entity: "product" }),
            _ => Ok(()),
        }
    }

    fn refresh_carts(&mut self, product: &Product) {
        let product = product.to_ref();
        for cart in self.carts.values_mut() {
            cart.refresh_product(&product);
        }
    }
}

/// Store kept entirely in memory. Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self { Self::default() }

    /// Customers have no public write endpoint; this seeds them directly.
    pub async fn insert_customer(&self, customer: NewCustomer) -> Customer {
        let mut state = self.state.lock().await;
        let id = bump(&mut state.last_customer_id);
        let customer = Customer {
            id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone: customer.phone,
            birth_date: customer.birth_date,
            membership: customer.membership,
        };
        state.customers.insert(id, customer.clone());
        customer
    }

    pub async fn insert_order(&self, customer_id: i64, payment_status: PaymentStatus) -> RepositoryResult<Order> {
        let mut state = self.state.lock().await;
        if !state.customers.contains_key(&customer_id) {
            return Err(RepositoryError::MissingReference { entity: "customer" });
        }
        let id = bump(&mut state.last_order_id);
        let order = Order { id, placed_at: Utc::now(), payment_status, customer_id };
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    /// Adds a line to an order, priced at the product's current price.
    pub async fn insert_order_item(&self, order_id: i64, product_id: i64, quantity: u32) -> RepositoryResult<OrderItem> {
        let mut state = self.state.lock().await;
        if !state.orders.contains_key(&order_id) {
            return Err(RepositoryError::MissingReference { entity: "order" });
        }
        let unit_price = state
            .products
            .get(&product_id)
            .map(|p| p.price)
            .ok_or(RepositoryError::MissingReference { entity: "product" })?;
        let id = bump(&mut state.last_order_item_id);
        let item = OrderItem { id, order_id, product_id, quantity, unit_price };
        state.order_items.push(item.clone());
        Ok(item)
    }
}

#[async_trait]
impl StoreRepository for MemoryRepository {
    async fn list_products(&self, query: &ProductQuery) -> RepositoryResult<Paged<CatalogEntry>> {
        let state = self.state.lock().await;
        let mut rows: Vec<CatalogEntry> = state
            .products
            .values()
            .filter(|p| query.collection_id.map_or(true, |c| p.collection_id == c))
            .filter(|p| query.search.as_deref().map_or(true, |term| p.matches_search(term)))
            .filter(|p| query.updated_since.map_or(true, |since| p.last_update >= since))
            .map(|p| state.catalog_entry(p))
            .collect();
        rows.sort_by(|a, b| {
            let (a, b) = (&a.product, &b.product);
            let ord = match query.sort.field {
                ProductSortField::Id => a.id.cmp(&b.id),
                ProductSortField::Title => a.title.cmp(&b.title),
                ProductSortField::Price => a.price.cmp(&b.price),
                ProductSortField::Inventory => a.inventory.cmp(&b.inventory),
                ProductSortField::LastUpdate => a.last_update.cmp(&b.last_update),
            };
            query.sort.apply(ord).then(a.id.cmp(&b.id))
        });
        Ok(query.page.slice(rows))
    }

    async fn get_product(&self, id: i64) -> RepositoryResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn product_exists(&self, id: i64) -> RepositoryResult<bool> {
        Ok(self.state.lock().await.products.contains_key(&id))
    }

    async fn create_product(&self, product: NewProduct) -> RepositoryResult<Product> {
        let mut state = self.state.lock().await;
        state.require_collection(product.collection_id)?;
        let id = bump(&mut state.last_product_id);
        let product = Product {
            id,
            title: product.title,
            slug: product.slug,
            description: product.description,
            price: product.price,
            inventory: product.inventory,
            last_update: Utc::now(),
            collection_id: product.collection_id,
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i64, product: NewProduct) -> RepositoryResult<Option<Product>> {
        let mut state = self.state.lock().await;
        state.require_collection(product.collection_id)?;
        let Some(existing) = state.products.get_mut(&id) else { return Ok(None) };
        existing.title = product.title;
        existing.slug = product.slug;
        existing.description = product.description;
        existing.price = product.price;
        existing.inventory = product.inventory;
        existing.collection_id = product.collection_id;
        existing.last_update = Utc::now();
        let updated = existing.clone();
        state.refresh_carts(&updated);
        Ok(Some(updated))
    }

    async fn update_product_price(&self, id: i64, price: Price) -> RepositoryResult<Option<CatalogEntry>> {
        let mut state = self.state.lock().await;
        let Some(existing) = state.products.get_mut(&id) else { return Ok(None) };
        existing.price = price;
        existing.last_update = Utc::now();
        let updated = existing.clone();
        state.refresh_carts(&updated);
        Ok(Some(state.catalog_entry(&updated)))
    }

    async fn delete_product(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.lock().await;
        if !state.products.contains_key(&id) {
            return Ok(false);
        }
        if state.order_items.iter().any(|i| i.product_id == id) {
            return Err(RepositoryError::Protected { entity: "product", id, referenced_by: "order items" });
        }
        state.products.remove(&id);
        state.reviews.retain(|_, r| r.product_id != id);
        for collection in state.collections.values_mut().filter(|c| c.featured_product_id == Some(id)) {
            collection.featured_product_id = None;
        }
        for cart in state.carts.values_mut() {
            cart.remove_product(id);
        }
        Ok(true)
    }

    async fn ordered_products(&self) -> RepositoryResult<Vec<Product>> {
        let state = self.state.lock().await;
        let ids: BTreeSet<i64> = state.order_items.iter().map(|i| i.product_id).collect();
        let mut products: Vec<Product> = ids.iter().filter_map(|id| state.products.get(id).cloned()).collect();
        products.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn list_collections(&self, query: &CollectionQuery) -> RepositoryResult<Paged<Collection>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Collection> = state.collections.keys().filter_map(|id| state.collection(*id)).collect();
        rows.sort_by(|a, b| {
            let ord = match query.sort.field {
                CollectionSortField::Id => a.id.cmp(&b.id),
                CollectionSortField::Title => a.title.cmp(&b.title),
                CollectionSortField::ProductsCount => a.products_count.cmp(&b.products_count),
            };
            query.sort.apply(ord).then(a.id.cmp(&b.id))
        });
        Ok(match query.page {
            Some(page) => page.slice(rows),
            None => Paged::all(rows),
        })
    }

    async fn get_collection(&self, id: i64) -> RepositoryResult<Option<Collection>> {
        Ok(self.state.lock().await.collection(id))
    }

    async fn create_collection(&self, collection: NewCollection) -> RepositoryResult<Collection> {
        let mut state = self.state.lock().await;
        state.require_featured(collection.featured_product_id)?;
        let id = bump(&mut state.last_collection_id);
        let NewCollection { title, featured_product_id } = collection;
        state.collections.insert(id, StoredCollection { title: title.clone(), featured_product_id });
        Ok(Collection { id, title, featured_product_id, products_count: 0 })
    }

    async fn update_collection(&self, id: i64, collection: NewCollection) -> RepositoryResult<Option<Collection>> {
        let mut state = self.state.lock().await;
        state.require_featured(collection.featured_product_id)?;
        match state.collections.get_mut(&id) {
            Some(existing) => {
                existing.title = collection.title;
                existing.featured_product_id = collection.featured_product_id;
            }
            None => return Ok(None),
        }
        Ok(state.collection(id))
    }

    async fn delete_collection(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.lock().await;
        if !state.collections.contains_key(&id) {
            return Ok(false);
        }
        if state.products.values().any(|p| p.collection_id == id) {
            return Err(RepositoryError::Protected { entity: "collection", id, referenced_by: "products" });
        }
        state.collections.remove(&id);
        Ok(true)
    }

    async fn list_reviews(&self, product_id: i64) -> RepositoryResult<Vec<Review>> {
        let state = self.state.lock().await;
        Ok(state.reviews.values().filter(|r| r.product_id == product_id).cloned().collect())
    }

    async fn get_review(&self, product_id: i64, id: i64) -> RepositoryResult<Option<Review>> {
        let state = self.state.lock().await;
        Ok(state.reviews.get(&id).filter(|r| r.product_id == product_id).cloned())
    }

    async fn create_review(&self, product_id: i64, review: NewReview) -> RepositoryResult<Review> {
        let mut state = self.state.lock().await;
        if !state.products.contains_key(&product_id) {
            return Err(RepositoryError::MissingReference { entity: "product" });
        }
        let id = bump(&mut state.last_review_id);
        let review = Review { id, product_id, date: Utc::now().date_naive(), name: review.name, description: review.description };
        state.reviews.insert(id, review.clone());
        Ok(review)
    }

    async fn update_review(&self, product_id: i64, id: i64, review: NewReview) -> RepositoryResult<Option<Review>> {
        let mut state = self.state.lock().await;
        let Some(existing) = state.reviews.get_mut(&id).filter(|r| r.product_id == product_id) else { return Ok(None) };
        existing.name = review.name;
        existing.description = review.description;
        Ok(Some(existing.clone()))
    }

    async fn delete_review(&self, product_id: i64, id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.lock().await;
        if state.reviews.get(&id).map_or(false, |r| r.product_id == product_id) {
            state.reviews.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn create_cart(&self) -> RepositoryResult<Cart> {
        let cart = Cart::new();
        self.state.lock().await.carts.insert(cart.id(), cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, id: Uuid) -> RepositoryResult<Option<Cart>> {
        Ok(self.state.lock().await.carts.get(&id).cloned())
    }

    async fn delete_cart(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(self.state.lock().await.carts.remove(&id).is_some())
    }

    async fn add_cart_item(&self, cart_id: Uuid, product_id: i64, quantity: Quantity) -> RepositoryResult<CartItemUpsert> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let product = state
            .products
            .get(&product_id)
            .map(Product::to_ref)
            .ok_or(RepositoryError::MissingReference { entity: "product" })?;
        let cart = state.carts.get_mut(&cart_id).ok_or(RepositoryError::MissingReference { entity: "cart" })?;
        let candidate = state.last_cart_item_id + 1;
        let upsert = cart.add_item(candidate, product, quantity);
        if !upsert.merged {
            state.last_cart_item_id = candidate;
        }
        Ok(upsert)
    }

    async fn set_cart_item_quantity(&self, cart_id: Uuid, item_id: i64, quantity: Quantity) -> RepositoryResult<Option<CartItem>> {
        let mut state = self.state.lock().await;
        let Some(cart) = state.carts.get_mut(&cart_id) else { return Ok(None) };
        Ok(cart.set_quantity(item_id, quantity).ok().cloned())
    }

    async fn delete_cart_item(&self, cart_id: Uuid, item_id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.lock().await;
        let Some(cart) = state.carts.get_mut(&cart_id) else { return Ok(false) };
        Ok(cart.remove_item(item_id).is_ok())
    }

    async fn list_customers(&self, query: &CustomerQuery) -> RepositoryResult<Paged<CustomerSummary>> {
        let state = self.state.lock().await;
        let mut rows: Vec<CustomerSummary> = state
            .customers
            .values()
            .filter(|c| query.name_prefix.as_deref().map_or(true, |q| c.name_starts_with(q)))
            .map(|c| state.customer_summary(c))
            .collect();
        rows.sort_by(|a, b| {
            let ord = match query.sort.field {
                CustomerSortField::Name => (&a.customer.first_name, &a.customer.last_name)
                    .cmp(&(&b.customer.first_name, &b.customer.last_name)),
                CustomerSortField::OrdersCount => a.orders_count.cmp(&b.orders_count),
            };
            query.sort.apply(ord).then(a.customer.id.cmp(&b.customer.id))
        });
        Ok(query.page.slice(rows))
    }

    async fn update_customer_membership(&self, id: i64, membership: Membership) -> RepositoryResult<Option<CustomerSummary>> {
        let mut state = self.state.lock().await;
        let Some(customer) = state.customers.get_mut(&id) else { return Ok(None) };
        customer.membership = membership;
        let customer = customer.clone();
        Ok(Some(state.customer_summary(&customer)))
    }

    async fn list_orders(&self, query: &OrderQuery) -> RepositoryResult<Paged<OrderSummary>> {
        let state = self.state.lock().await;
        let mut rows: Vec<OrderSummary> = state
            .orders
            .values()
            .filter(|o| query.customer_id.map_or(true, |c| o.customer_id == c))
            .map(|o| state.order_summary(o))
            .collect();
        rows.sort_by(|a, b| a.order.placed_at.cmp(&b.order.placed_at).then(a.order.id.cmp(&b.order.id)));
        Ok(query.page.slice(rows))
    }

    async fn update_order_payment_status(&self, id: i64, status: PaymentStatus) -> RepositoryResult<Option<OrderSummary>> {
        let mut state = self.state.lock().await;
        let Some(order) = state.orders.get_mut(&id) else { return Ok(None) };
        order.payment_status = status;
        let order = order.clone();
        Ok(Some(state.order_summary(&order)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Slug;
    use crate::repository::{PageRequest, Sort};
    use rust_decimal::Decimal;

    async fn seeded() -> (MemoryRepository, i64, i64) {
        let repo = MemoryRepository::new();
        let collection = repo
            .create_collection(NewCollection { title: "Kitchen".into(), featured_product_id: None })
            .await
            .unwrap();
        let product = repo
            .create_product(NewProduct {
                title: "Teapot".into(),
                slug: Slug::new("teapot").unwrap(),
                description: String::new(),
                price: Price::new(Decimal::new(2500, 2)).unwrap(),
                inventory: 40,
                collection_id: collection.id,
            })
            .await
            .unwrap();
        (repo, collection.id, product.id)
    }

    fn qty(n: u32) -> Quantity { Quantity::new(n).unwrap() }

    #[tokio::test]
    async fn test_upsert_increments_existing_line() {
        let (repo, _, product_id) = seeded().await;
        let cart = repo.create_cart().await.unwrap();
        let first = repo.add_cart_item(cart.id(), product_id, qty(2)).await.unwrap();
        let second = repo.add_cart_item(cart.id(), product_id, qty(5)).await.unwrap();
        assert!(!first.merged);
        assert!(second.merged);
        assert_eq!(first.item.id, second.item.id);
        let cart = repo.get_cart(cart.id()).await.unwrap().unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity.value(), 7);
        assert_eq!(cart.total_price(), Decimal::new(175, 0));
    }

    #[tokio::test]
    async fn test_upsert_rejects_missing_product_and_cart() {
        let (repo, _, product_id) = seeded().await;
        let cart = repo.create_cart().await.unwrap();
        let err = repo.add_cart_item(cart.id(), 999, qty(1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::MissingReference { entity: "product" }));
        let err = repo.add_cart_item(Uuid::new_v4(), product_id, qty(1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::MissingReference { entity: "cart" }));
        assert!(repo.get_cart(cart.id()).await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_adds_do_not_lose_quantity() {
        let (repo, _, product_id) = seeded().await;
        let repo = std::sync::Arc::new(repo);
        let cart_id = repo.create_cart().await.unwrap().id();
        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.add_cart_item(cart_id, product_id, qty(1)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        let cart = repo.get_cart(cart_id).await.unwrap().unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].quantity.value(), 20);
    }

    #[tokio::test]
    async fn test_delete_product_is_protected_by_order_items() {
        let (repo, collection_id, product_id) = seeded().await;
        let customer = repo
            .insert_customer(NewCustomer {
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                email: "grace@example.com".into(),
                phone: String::new(),
                birth_date: None,
                membership: Membership::Silver,
            })
            .await;
        let order = repo.insert_order(customer.id, PaymentStatus::Pending).await.unwrap();
        repo.insert_order_item(order.id, product_id, 1).await.unwrap();

        let err = repo.delete_product(product_id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Protected { entity: "product", .. }));
        let err = repo.delete_collection(collection_id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Protected { entity: "collection", .. }));
        assert_eq!(repo.ordered_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_counts_are_annotated() {
        let (repo, collection_id, _) = seeded().await;
        let collection = repo.get_collection(collection_id).await.unwrap().unwrap();
        assert_eq!(collection.products_count, 1);

        let customer = repo
            .insert_customer(NewCustomer {
                first_name: "Alan".into(),
                last_name: "Turing".into(),
                email: "alan@example.com".into(),
                phone: String::new(),
                birth_date: None,
                membership: Membership::Bronze,
            })
            .await;
        repo.insert_order(customer.id, PaymentStatus::Pending).await.unwrap();
        repo.insert_order(customer.id, PaymentStatus::Complete).await.unwrap();
        let page = repo
            .list_customers(&CustomerQuery {
                name_prefix: Some("tur".into()),
                sort: Sort::asc(CustomerSortField::Name),
                page: PageRequest::new(None, 10),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].orders_count, 2);
    }

    #[tokio::test]
    async fn test_deleting_product_cascades_to_cart_lines() {
        let (repo, _, product_id) = seeded().await;
        let cart = repo.create_cart().await.unwrap();
        repo.add_cart_item(cart.id(), product_id, qty(3)).await.unwrap();
        assert!(repo.delete_product(product_id).await.unwrap());
        assert!(repo.get_cart(cart.id()).await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_featured_product_must_exist_and_clears_on_delete() {
        let (repo, collection_id, product_id) = seeded().await;
        let err = repo
            .create_collection(NewCollection { title: "Sale".into(), featured_product_id: Some(999) })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::MissingReference { entity: "product" }));

        let featured = NewCollection { title: "Kitchen".into(), featured_product_id: Some(product_id) };
        let updated = repo.update_collection(collection_id, featured).await.unwrap().unwrap();
        assert_eq!(updated.featured_product_id, Some(product_id));

        assert!(repo.delete_product(product_id).await.unwrap());
        let collection = repo.get_collection(collection_id).await.unwrap().unwrap();
        assert_eq!(collection.featured_product_id, None);
    }

    #[tokio::test]
    async fn test_unpaged_collection_list_returns_every_row() {
        let repo = MemoryRepository::new();
        for n in 0..25 {
            repo.create_collection(NewCollection { title: format!("Collection {n}"), featured_product_id: None })
                .await
                .unwrap();
        }
        let all = repo
            .list_collections(&CollectionQuery { sort: Sort::asc(CollectionSortField::Id), page: None })
            .await
            .unwrap();
        assert_eq!(all.items.len(), 25);
        assert_eq!(all.total, 25);
    }
}
