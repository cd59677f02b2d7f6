use crate::{
    db_types::{NewTransaction, OrderId, TransactionRecord},
    traits::StoreError,
};

/// The append-only audit trail of webhook deliveries.
///
/// Every delivery (parent or child, valid order or not) is written here *before* reconciliation runs. If the append
/// fails, reconciliation must not run and the webhook must report failure so the sender redelivers; this guarantees
/// no notification effect is ever applied without an audit record. Records are keyed by a store-assigned delivery id,
/// never by `payment_id`, so duplicate deliveries of the same logical payment each get their own row.
///
/// Implementations never update or delete rows, and appends need no cross-request coordination.
#[allow(async_fn_in_trait)]
pub trait TransactionStore {
    /// Durably appends a delivery record, returning the assigned delivery id.
    async fn append_transaction(&self, tx: NewTransaction) -> Result<i64, StoreError>;

    /// Returns all stored deliveries for an order, oldest first.
    async fn fetch_transactions_for_order(&self, order_id: &OrderId) -> Result<Vec<TransactionRecord>, StoreError>;
}
