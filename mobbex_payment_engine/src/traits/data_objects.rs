use mwg_common::Money;

/// The bundle of bookkeeping updates a parent notification produces: metadata entries, audit notes and the
/// payment-method display title.
///
/// The reconciler computes the whole annotation up front and the store applies it in one transaction, so a crash
/// mid-delivery never leaves a half-annotated order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderAnnotation {
    /// Key/value pairs to upsert into the order metadata.
    pub metadata: Vec<(String, String)>,
    /// Audit notes to append, in order.
    pub notes: Vec<String>,
    /// Display title for the payment method, when one was resolved.
    pub payment_method: Option<String>,
}

impl OrderAnnotation {
    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.push((key.to_string(), value.into()));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Outcome of the idempotent total reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalReconciliation {
    /// The totals already matched, or the adjustment had been applied by an earlier delivery.
    Unchanged,
    /// A surcharge or discount line item for `delta` was recorded and the order total updated.
    Adjusted { delta: Money },
}
