//! Aggregates module
pub mod product;
pub mod customer;
pub mod review;
pub mod cart;

pub use product::{Collection, NewCollection, NewProduct, Product, ProductRef};
pub use customer::{Customer, CustomerSummary, NewCustomer, Order, OrderItem, OrderSummary};
pub use review::{NewReview, Review};
pub use cart::{Cart, CartError, CartItem, CartItemUpsert};
