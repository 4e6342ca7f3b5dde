//! Value objects for the storefront catalog

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multiplier applied to a catalog price to obtain the tax-inclusive price (1.1).
pub const TAX_MULTIPLIER: Decimal = Decimal::from_parts(11, 0, 0, false, 1);

/// Products with fewer units than this on hand are reported as low stock.
pub const LOW_INVENTORY_THRESHOLD: i32 = 1000;

/// URL slug value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Result<Self, SlugError> {
        let value = value.into();
        if value.is_empty() { return Err(SlugError::Empty); }
        if value.len() > 255 { return Err(SlugError::TooLong); }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(value))
    }

    /// Wraps a slug read back from storage, where it was validated on the way in.
    pub fn from_stored(value: String) -> Self { Self(value) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SlugError { Empty, TooLong, InvalidCharacter }
impl std::error::Error for SlugError {}
impl fmt::Display for SlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "This field may not be blank."),
            Self::TooLong => write!(f, "Ensure this field has no more than 255 characters."),
            Self::InvalidCharacter => write!(f, "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens."),
        }
    }
}

/// Unit price of a catalog product.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Largest price a product column can hold (`NUMERIC(6, 2)`).
    pub const MAX: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::ONE { return Err(PriceError::BelowMinimum); }
        if amount > Self::MAX { return Err(PriceError::AboveMaximum); }
        if amount.scale() > 2 && amount.normalize().scale() > 2 { return Err(PriceError::TooManyDecimalPlaces); }
        Ok(Self(amount))
    }

    pub fn from_stored(amount: Decimal) -> Self { Self(amount) }
    pub fn amount(&self) -> Decimal { self.0 }

    /// Tax-inclusive price. Exact decimal product, never rounded.
    pub fn with_tax(&self) -> Decimal { self.0 * TAX_MULTIPLIER }

    pub fn times(&self, quantity: Quantity) -> Decimal { self.0 * Decimal::from(quantity.value()) }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PriceError { BelowMinimum, AboveMaximum, TooManyDecimalPlaces }
impl std::error::Error for PriceError {}
impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowMinimum => write!(f, "Ensure this value is greater than or equal to 1."),
            Self::AboveMaximum => write!(f, "Ensure that there are no more than 6 digits in total."),
            Self::TooManyDecimalPlaces => write!(f, "Ensure that there are no more than 2 decimal places."),
        }
    }
}

/// Cart line quantity, always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity accepted on a single request.
    pub const MAX_PER_REQUEST: u32 = 32_767;
    /// Ceiling for merged lines; the stored column is a signed 32-bit integer.
    pub const MAX_STORED: u32 = i32::MAX as u32;

    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        if value > Self::MAX_PER_REQUEST { return Err(QuantityError::TooLarge); }
        Ok(Self(value))
    }

    /// Wraps a stored quantity. Merged lines may exceed the per-request cap.
    pub fn from_stored(value: u32) -> Self { Self(value.max(1)) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn increase(&mut self, by: Quantity) { self.0 = self.0.saturating_add(by.0).min(Self::MAX_STORED); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum QuantityError { Zero, TooLarge }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "Ensure this value is greater than or equal to 1."),
            Self::TooLarge => write!(f, "Ensure this value is less than or equal to 32767."),
        }
    }
}

/// Stock level bucket shown next to each product in the admin list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryStatus { Low, Ok }

impl InventoryStatus {
    pub fn from_inventory(inventory: i32) -> Self {
        if inventory < LOW_INVENTORY_THRESHOLD { Self::Low } else { Self::Ok }
    }
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Low => write!(f, "Low"), Self::Ok => write!(f, "Ok") }
    }
}

/// Customer membership tier, stored as a one-letter code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Membership {
    #[default]
    #[serde(rename = "B")] Bronze,
    #[serde(rename = "S")] Silver,
    #[serde(rename = "G")] Gold,
}

impl Membership {
    pub fn code(&self) -> &'static str {
        match self { Self::Bronze => "B", Self::Silver => "S", Self::Gold => "G" }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() { "B" => Some(Self::Bronze), "S" => Some(Self::Silver), "G" => Some(Self::Gold), _ => None }
    }
}

/// Order payment state, stored as a one-letter code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    #[serde(rename = "P")] Pending,
    #[serde(rename = "C")] Complete,
    #[serde(rename = "F")] Failed,
}

impl PaymentStatus {
    pub fn code(&self) -> &'static str {
        match self { Self::Pending => "P", Self::Complete => "C", Self::Failed => "F" }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() { "P" => Some(Self::Pending), "C" => Some(Self::Complete), "F" => Some(Self::Failed), _ => None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(Slug::new("blue-mug_2").unwrap().as_str(), "blue-mug_2");
        assert_eq!(Slug::new("blue mug"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::new(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_tax_is_exact() {
        let price = Price::new(Decimal::new(1999, 2)).unwrap();
        assert_eq!(price.with_tax(), Decimal::new(21989, 3));
        let price = Price::new(Decimal::new(10, 0)).unwrap();
        assert_eq!(price.with_tax(), Decimal::new(11, 0));
    }

    #[test]
    fn test_price_bounds() {
        assert_eq!(Price::new(Decimal::new(99, 2)), Err(PriceError::BelowMinimum));
        assert_eq!(Price::new(Decimal::new(1_000_000, 2)), Err(PriceError::AboveMaximum));
        assert_eq!(Price::new(Decimal::new(1001, 3)), Err(PriceError::TooManyDecimalPlaces));
        assert!(Price::new(Decimal::new(1500, 3)).is_ok());
    }

    #[test]
    fn test_inventory_status_threshold() {
        assert_eq!(InventoryStatus::from_inventory(0), InventoryStatus::Low);
        assert_eq!(InventoryStatus::from_inventory(999), InventoryStatus::Low);
        assert_eq!(InventoryStatus::from_inventory(1000), InventoryStatus::Ok);
        assert_eq!(InventoryStatus::Low.to_string(), "Low");
    }

    #[test]
    fn test_quantity() {
        assert_eq!(Quantity::new(0), Err(QuantityError::Zero));
        assert_eq!(Quantity::new(32_768), Err(QuantityError::TooLarge));
        let mut q = Quantity::new(2).unwrap();
        q.increase(Quantity::new(3).unwrap());
        assert_eq!(q.value(), 5);

        let mut full = Quantity::from_stored(Quantity::MAX_STORED - 1);
        full.increase(Quantity::new(10).unwrap());
        assert_eq!(full.value(), Quantity::MAX_STORED);
    }

    #[test]
    fn test_codes() {
        assert_eq!(Membership::from_code("G"), Some(Membership::Gold));
        assert_eq!(PaymentStatus::Failed.code(), "F");
        assert_eq!(serde_json::to_string(&PaymentStatus::Complete).unwrap(), "\"C\"");
    }
}
