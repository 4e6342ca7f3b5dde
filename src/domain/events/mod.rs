//! Domain events
use crate::domain::value_objects::{Membership, PaymentStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    CartItemAdded { cart_id: Uuid, item_id: i64, product_id: i64, quantity: u32, merged: bool },
    CartItemUpdated { cart_id: Uuid, item_id: i64, quantity: u32 },
    CartItemRemoved { cart_id: Uuid, item_id: i64 },
    CartDeleted { cart_id: Uuid },
    ReviewPosted { product_id: i64, review_id: i64 },
    ProductPriceChanged { product_id: i64, price: Decimal },
    CustomerMembershipChanged { customer_id: i64, membership: Membership },
    OrderPaymentStatusChanged { order_id: i64, payment_status: PaymentStatus },
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::CartItemAdded { .. } => "store.cart.item_added",
            Self::CartItemUpdated { .. } => "store.cart.item_updated",
            Self::CartItemRemoved { .. } => "store.cart.item_removed",
            Self::CartDeleted { .. } => "store.cart.deleted",
            Self::ReviewPosted { .. } => "store.review.posted",
            Self::ProductPriceChanged { .. } => "store.product.price_changed",
            Self::CustomerMembershipChanged { .. } => "store.customer.membership_changed",
            Self::OrderPaymentStatusChanged { .. } => "store.order.payment_status_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload_is_tagged() {
        let event = DomainEvent::OrderPaymentStatusChanged { order_id: 4, payment_status: PaymentStatus::Complete };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "order_payment_status_changed");
        assert_eq!(json["payment_status"], "C");
        assert_eq!(event.subject(), "store.order.payment_status_changed");
    }
}
