use serde::{Deserialize, Serialize};

use crate::db_types::OrderId;

/// Fired once a parent notification has been fully reconciled against its order.
///
/// Carries the order id and the decoded notification payload, so subscribers (fulfilment jobs, analytics, back-office
/// sync) can react without re-reading the store. Delivery is best-effort: a failing or absent subscriber never
/// affects the webhook outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookProcessedEvent {
    pub order_id: OrderId,
    pub payload: serde_json::Value,
}

impl WebhookProcessedEvent {
    pub fn new(order_id: OrderId, payload: serde_json::Value) -> Self {
        Self { order_id, payload }
    }
}
