//! Storefront domain: records, value objects, computed fields and events.
pub mod aggregates;
pub mod events;
pub mod value_objects;

pub use aggregates::*;
pub use events::DomainEvent;
pub use value_objects::{InventoryStatus, Membership, PaymentStatus, Price, Quantity, Slug};
