use mwg_common::Money;

use crate::db_types::OrderId;

/// The caller-visible result of processing a webhook notification.
///
/// Only [`ReconcileOutcome::Invalid`] maps to a failed webhook response; the other variants all report success to the
/// sender so that it stops redelivering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The notification failed validation (bad token, missing order id, unknown order). Nothing was mutated.
    Invalid(String),
    /// The status code denoted a refund and one was requested from the order subsystem.
    Refunded { order_id: OrderId, amount: Money },
    /// A child transaction was recorded as a single audit note; no financial or status state changed.
    ChildAnnotated(OrderId),
    /// Full parent reconciliation ran to completion.
    Completed(OrderId),
}

impl ReconcileOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ReconcileOutcome::Invalid(_))
    }
}
