//! Integration events exchanged between services.
//!
//! Every event carries the same [`IntegrationEvent`] envelope, flattened into its JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IntegrationEvent {
    pub id: Uuid,
    pub creation_date: DateTime<Utc>,
    pub event_type: String,
    /// Emitting service
    pub source: String,
    pub correlation_id: Option<String>,
}

impl IntegrationEvent {
    pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            creation_date: Utc::now(),
            event_type: event_type.into(),
            source: source.into(),
            correlation_id: None,
        }
    }
}

/// Access to the envelope shared by all events.
pub trait Event: Sized {
    const EVENT_TYPE: &'static str;

    fn envelope(&self) -> &IntegrationEvent;
    fn envelope_mut(&mut self) -> &mut IntegrationEvent;

    fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.envelope_mut().correlation_id = Some(correlation_id.into());
        self
    }
}

macro_rules! impl_event {
    ($ty:ident) => {
        impl Event for $ty {
            const EVENT_TYPE: &'static str = stringify!($ty);

            fn envelope(&self) -> &IntegrationEvent {
                &self.envelope
            }

            fn envelope_mut(&mut self) -> &mut IntegrationEvent {
                &mut self.envelope
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemEvent {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Cents
    pub unit_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderCreatedEvent {
    #[serde(flatten)]
    pub envelope: IntegrationEvent,
    pub order_id: Uuid,
    pub user_id: String,
    /// Cents
    pub total_amount: i64,
    pub items: Vec<OrderItemEvent>,
}

impl OrderCreatedEvent {
    pub fn new(
        source: impl Into<String>,
        order_id: Uuid,
        user_id: impl Into<String>,
        total_amount: i64,
        items: Vec<OrderItemEvent>,
    ) -> Self {
        Self {
            envelope: IntegrationEvent::new(Self::EVENT_TYPE, source),
            order_id,
            user_id: user_id.into(),
            total_amount,
            items,
        }
    }
}

impl_event!(OrderCreatedEvent);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentProcessedEvent {
    #[serde(flatten)]
    pub envelope: IntegrationEvent,
    pub order_id: Uuid,
    pub payment_id: Uuid,
    pub status: String,
    /// Cents
    pub amount: i64,
    pub transaction_id: Option<String>,
}

impl PaymentProcessedEvent {
    pub fn new(
        source: impl Into<String>,
        order_id: Uuid,
        payment_id: Uuid,
        status: impl Into<String>,
        amount: i64,
        transaction_id: Option<String>,
    ) -> Self {
        Self {
            envelope: IntegrationEvent::new(Self::EVENT_TYPE, source),
            order_id,
            payment_id,
            status: status.into(),
            amount,
            transaction_id,
        }
    }
}

impl_event!(PaymentProcessedEvent);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InventoryUpdatedEvent {
    #[serde(flatten)]
    pub envelope: IntegrationEvent,
    pub product_id: Uuid,
    /// Signed delta applied to the stock level
    pub quantity_change: i32,
    pub new_stock_level: i32,
    pub reason: String,
}

impl InventoryUpdatedEvent {
    pub fn new(
        source: impl Into<String>,
        product_id: Uuid,
        quantity_change: i32,
        new_stock_level: i32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            envelope: IntegrationEvent::new(Self::EVENT_TYPE, source),
            product_id,
            quantity_change,
            new_stock_level,
            reason: reason.into(),
        }
    }
}

impl_event!(InventoryUpdatedEvent);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRegisteredEvent {
    #[serde(flatten)]
    pub envelope: IntegrationEvent,
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserRegisteredEvent {
    pub fn new(
        source: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            envelope: IntegrationEvent::new(Self::EVENT_TYPE, source),
            user_id: user_id.into(),
            email: email.into(),
            username: username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

impl_event!(UserRegisteredEvent);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_is_flattened() {
        let product_id = Uuid::now_v7();
        let event = InventoryUpdatedEvent::new("products-api", product_id, -2, 8, "reserved")
            .with_correlation_id("req-42");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], json!("InventoryUpdatedEvent"));
        assert_eq!(value["source"], json!("products-api"));
        assert_eq!(value["correlation_id"], json!("req-42"));
        assert_eq!(value["new_stock_level"], json!(8));
        assert!(value.get("envelope").is_none());
    }

    #[test]
    fn test_each_event_gets_a_fresh_id() {
        let a = UserRegisteredEvent::new("auth-api", "sub-1", "a@example.com", "a", "A", "B");
        let b = UserRegisteredEvent::new("auth-api", "sub-1", "a@example.com", "a", "A", "B");
        assert_ne!(a.envelope().id, b.envelope().id);
        assert!(a.envelope().correlation_id.is_none());
    }

    #[test]
    fn test_order_created_deserializes_from_flat_json() {
        let order_id = Uuid::now_v7();
        let event = OrderCreatedEvent::new(
            "orders-api",
            order_id,
            "sub-9",
            4_500,
            vec![OrderItemEvent {
                product_id: Uuid::now_v7(),
                quantity: 3,
                unit_price: 1_500,
            }],
        );
        let text = serde_json::to_string(&event).unwrap();
        let back: OrderCreatedEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.envelope.event_type, OrderCreatedEvent::EVENT_TYPE);
    }
}
