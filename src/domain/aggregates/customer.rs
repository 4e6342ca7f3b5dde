//! Customer and order records

use chrono::{DateTime, NaiveDate, Utc};
use crate::domain::value_objects::{Membership, PaymentStatus, Price};

#[derive(Clone, Debug, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
}

/// A customer annotated with the number of orders they placed.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomerSummary {
    pub customer: Customer,
    pub orders_count: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub id: i64,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub customer_id: i64,
}

/// An order joined with its customer's name.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderSummary {
    pub order: Order,
    pub customer_first_name: String,
    pub customer_last_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: u32,
    pub unit_price: Price,
}

impl Customer {
    /// Case-insensitive prefix match on first or last name.
    pub fn name_starts_with(&self, prefix: &str) -> bool {
        let prefix = prefix.to_lowercase();
        self.first_name.to_lowercase().starts_with(&prefix) || self.last_name.to_lowercase().starts_with(&prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_prefix() {
        let c = Customer {
            id: 1, first_name: "Ada".into(), last_name: "Lovelace".into(), email: "ada@example.com".into(),
            phone: String::new(), birth_date: None, membership: Membership::Gold,
        };
        assert!(c.name_starts_with("ad"));
        assert!(c.name_starts_with("LOVE"));
        assert!(!c.name_starts_with("lace"));
    }
}
