//! Request and response bodies: the mapping between stored records and JSON.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{Cart, CartItem, Collection, NewCollection, NewProduct, NewReview, Price, Product, ProductRef, Review, Slug};
use crate::error::{ApiError, FieldErrors};
use crate::Links;

pub const NO_SUCH_PRODUCT: &str = "No product with the given id was found.";
pub const HYPERLINK_NO_MATCH: &str = "Invalid hyperlink - No URL match.";
pub const HYPERLINK_MISSING_OBJECT: &str = "Invalid hyperlink - Object does not exist.";

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field may not be blank.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub inventory: i32,
    pub price_with_tax: Decimal,
    pub collection: String,
}

impl ProductResponse {
    pub fn new(product: &Product, links: &Links) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            slug: product.slug.to_string(),
            description: product.description.clone(),
            price: product.price.amount(),
            inventory: product.inventory,
            price_with_tax: product.price_with_tax(),
            collection: links.collection(product.collection_id),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(custom = "not_blank", length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub inventory: i32,
    /// Hyperlink to the owning collection.
    pub collection: String,
}

impl ProductRequest {
    pub fn into_new_product(self, collection_id: i64) -> Result<NewProduct, ApiError> {
        let mut errors = FieldErrors::new();
        let slug = Slug::new(self.slug).map_err(|e| errors.insert("slug".into(), vec![e.to_string()])).ok();
        let price = Price::new(self.price).map_err(|e| errors.insert("price".into(), vec![e.to_string()])).ok();
        match (slug, price) {
            (Some(slug), Some(price)) => Ok(NewProduct {
                title: self.title,
                slug,
                description: self.description,
                price,
                inventory: self.inventory,
                collection_id,
            }),
            _ => Err(ApiError::Validation(errors)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub id: i64,
    pub title: String,
    pub featured_product_id: Option<i64>,
    pub products_count: i64,
}

impl From<Collection> for CollectionResponse {
    fn from(c: Collection) -> Self {
        Self { id: c.id, title: c.title, featured_product_id: c.featured_product_id, products_count: c.products_count }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CollectionRequest {
    #[validate(custom = "not_blank", length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub title: String,
    #[serde(default)]
    pub featured_product_id: Option<i64>,
}

impl From<CollectionRequest> for NewCollection {
    fn from(r: CollectionRequest) -> Self { Self { title: r.title, featured_product_id: r.featured_product_id } }
}

/// Message for a primary key that names no row.
pub fn missing_pk(id: i64) -> String { format!("Invalid pk \"{id}\" - object does not exist.") }

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub date: NaiveDate,
    pub name: String,
    pub description: String,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self { Self { id: r.id, date: r.date, name: r.name, description: r.description } }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(custom = "not_blank", length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: String,
    #[validate(custom = "not_blank")]
    pub description: String,
}

impl From<ReviewRequest> for NewReview {
    fn from(r: ReviewRequest) -> Self { Self { name: r.name, description: r.description } }
}

#[derive(Debug, Serialize)]
pub struct SimpleProduct {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
}

impl From<&ProductRef> for SimpleProduct {
    fn from(p: &ProductRef) -> Self { Self { id: p.id, title: p.title.clone(), price: p.price.amount() } }
}

impl From<&Product> for SimpleProduct {
    fn from(p: &Product) -> Self { Self { id: p.id, title: p.title.clone(), price: p.price.amount() } }
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: i64,
    pub product: SimpleProduct,
    pub quantity: u32,
    pub total_price: Decimal,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            product: SimpleProduct::from(&item.product),
            quantity: item.quantity.value(),
            total_price: item.total_price(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: Uuid,
    pub items: Vec<CartItemResponse>,
    pub total_price: Decimal,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id(),
            items: cart.items().iter().map(CartItemResponse::from).collect(),
            total_price: cart.total_price(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddCartItemRequest {
    pub product_id: i64,
    /// Upper bound is enforced by [`crate::domain::Quantity::new`].
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct AddCartItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: u32,
}

impl From<&CartItem> for AddCartItemResponse {
    fn from(item: &CartItem) -> Self { Self { id: item.id, product_id: item.product.id, quantity: item.quantity.value() } }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    /// Upper bound is enforced by [`crate::domain::Quantity::new`].
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub quantity: u32,
}
