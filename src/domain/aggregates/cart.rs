//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use crate::domain::aggregates::ProductRef;
use crate::domain::value_objects::Quantity;

#[derive(Clone, Debug, PartialEq)]
pub struct Cart {
    id: Uuid,
    items: Vec<CartItem>,
    created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CartItem {
    pub id: i64,
    pub product: ProductRef,
    pub quantity: Quantity,
}

/// Outcome of adding a product to a cart.
#[derive(Clone, Debug, PartialEq)]
pub struct CartItemUpsert {
    pub item: CartItem,
    /// `true` when an existing line absorbed the quantity.
    pub merged: bool,
}

impl CartItem {
    pub fn total_price(&self) -> Decimal { self.product.price.times(self.quantity) }
}

impl Cart {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4(), items: vec![], created_at: Utc::now() }
    }

    pub fn from_parts(id: Uuid, created_at: DateTime<Utc>, items: Vec<CartItem>) -> Self {
        Self { id, items, created_at }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item(&self, item_id: i64) -> Option<&CartItem> { self.items.iter().find(|i| i.id == item_id) }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::total_price).sum()
    }

    /// Adds `quantity` of `product`, merging into the existing line for that
    /// product if there is one. `new_item_id` is only used when a line is created.
    pub fn add_item(&mut self, new_item_id: i64, product: ProductRef, quantity: Quantity) -> CartItemUpsert {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            existing.quantity.increase(quantity);
            existing.product = product;
            return CartItemUpsert { item: existing.clone(), merged: true };
        }
        let item = CartItem { id: new_item_id, product, quantity };
        self.items.push(item.clone());
        CartItemUpsert { item, merged: false }
    }

    pub fn set_quantity(&mut self, item_id: i64, quantity: Quantity) -> Result<&CartItem, CartError> {
        let item = self.items.iter_mut().find(|i| i.id == item_id).ok_or(CartError::ItemNotFound)?;
        item.quantity = quantity;
        Ok(item)
    }

    pub fn remove_item(&mut self, item_id: i64) -> Result<CartItem, CartError> {
        let pos = self.items.iter().position(|i| i.id == item_id).ok_or(CartError::ItemNotFound)?;
        Ok(self.items.remove(pos))
    }

    /// Drops every line for a product that no longer exists.
    pub fn remove_product(&mut self, product_id: i64) {
        self.items.retain(|i| i.product.id != product_id);
    }

    /// Refreshes the embedded title and price of lines for `product`.
    pub fn refresh_product(&mut self, product: &ProductRef) {
        for item in self.items.iter_mut().filter(|i| i.product.id == product.id) {
            item.product = product.clone();
        }
    }
}

impl Default for Cart {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { ItemNotFound }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Item not found") }
}
