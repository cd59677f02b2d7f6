use mwg_common::Money;
use thiserror::Error;

use crate::{
    db_types::{DomainStatus, LineItem, NewOrder, Order, OrderId},
    traits::data_objects::{OrderAnnotation, TotalReconciliation},
};

/// Access to the order aggregate.
///
/// Implementations must serialise concurrent mutations per order: every method that writes performs its
/// read-modify-write inside a single database transaction, so two deliveries racing on the same order cannot both
/// observe `payment_completed == false` or `total_reconciled == false`.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Inserts a brand-new order. This call is idempotent: if the order already exists, the stored order is
    /// returned and the second element is `false`.
    ///
    /// Order creation belongs to the checkout flow; the engine only needs this for seeding.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), StoreError>;

    /// Fetches the order for the given merchant order id, or `None` if it does not exist.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Applies the full bookkeeping annotation (metadata upserts, appended notes, payment-method title) in one
    /// atomic transaction and returns the updated order.
    async fn annotate_order(&self, order_id: &OrderId, annotation: OrderAnnotation) -> Result<Order, StoreError>;

    /// Transitions the order status unconditionally, storing the gateway's status message alongside.
    async fn set_order_status(
        &self,
        order_id: &OrderId,
        status: DomainStatus,
        message: &str,
    ) -> Result<Order, StoreError>;

    /// Marks the payment as completed with the given gateway payment reference.
    ///
    /// Returns `true` if this call performed the transition and `false` if the payment had already been completed by
    /// an earlier delivery. The check-and-set runs atomically.
    async fn complete_payment(&self, order_id: &OrderId, payment_ref: &str) -> Result<bool, StoreError>;

    /// Reconciles the order total against the notified total.
    ///
    /// If the totals already match, or a previous delivery already adjusted this order, nothing but the collected
    /// total is written. Otherwise a single surcharge/discount line item for the difference is recorded and the
    /// one-way `total_reconciled` flag is set. In both cases the order's collected total ends up equal to
    /// `notified_total`.
    async fn reconcile_total(
        &self,
        order_id: &OrderId,
        notified_total: Money,
    ) -> Result<TotalReconciliation, StoreError>;

    /// Appends a single audit note to the order.
    async fn add_note(&self, order_id: &OrderId, note: &str) -> Result<i64, StoreError>;

    /// Requests a refund of `amount` against the order from the order/payment subsystem.
    async fn create_refund(&self, order_id: &OrderId, amount: Money) -> Result<i64, StoreError>;

    /// Returns the order's audit notes in append order.
    async fn fetch_notes(&self, order_id: &OrderId) -> Result<Vec<String>, StoreError>;

    /// Returns a single metadata value for the order, if set.
    async fn fetch_metadata(&self, order_id: &OrderId, key: &str) -> Result<Option<String>, StoreError>;

    /// Returns the surcharge/discount line items recorded against the order.
    async fn fetch_line_items(&self, order_id: &OrderId) -> Result<Vec<LineItem>, StoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Internal database engine error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
