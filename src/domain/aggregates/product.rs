//! Product and collection records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use crate::domain::value_objects::{InventoryStatus, Price, Slug};

#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub slug: Slug,
    pub description: String,
    pub price: Price,
    pub inventory: i32,
    pub last_update: DateTime<Utc>,
    pub collection_id: i64,
}

/// Writable product fields, as accepted on create and full update.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub slug: Slug,
    pub description: String,
    pub price: Price,
    pub inventory: i32,
    pub collection_id: i64,
}

/// The slice of a product embedded in cart lines and order listings.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductRef {
    pub id: i64,
    pub title: String,
    pub price: Price,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    /// Cleared when the product is deleted.
    pub featured_product_id: Option<i64>,
    pub products_count: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewCollection {
    pub title: String,
    pub featured_product_id: Option<i64>,
}

impl Product {
    pub fn price_with_tax(&self) -> Decimal { self.price.with_tax() }
    pub fn inventory_status(&self) -> InventoryStatus { InventoryStatus::from_inventory(self.inventory) }

    /// Case-insensitive substring match over title and description.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term) || self.description.to_lowercase().contains(&term)
    }

    pub fn to_ref(&self) -> ProductRef {
        ProductRef { id: self.id, title: self.title.clone(), price: self.price }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(inventory: i32) -> Product {
        Product {
            id: 1, title: "Coffee Mug".into(), slug: Slug::new("coffee-mug").unwrap(),
            description: "Stoneware, 350ml".into(), price: Price::new(Decimal::new(1250, 2)).unwrap(),
            inventory, last_update: Utc::now(), collection_id: 3,
        }
    }

    #[test]
    fn test_computed_fields() {
        let p = product(12);
        assert_eq!(p.price_with_tax(), Decimal::new(13750, 3));
        assert_eq!(p.inventory_status(), InventoryStatus::Low);
        assert_eq!(product(5000).inventory_status(), InventoryStatus::Ok);
    }

    #[test]
    fn test_search() {
        let p = product(1);
        assert!(p.matches_search("mug"));
        assert!(p.matches_search("STONEWARE"));
        assert!(!p.matches_search("teapot"));
    }
}
