use std::collections::HashSet;

use crate::db_types::DomainStatus;

/// The classification table mapping Mobbex's numeric status codes onto [`DomainStatus`] values.
///
/// The code space is owned by the gateway and changes over time, so the sets are configuration handed in at
/// construction rather than logic. The defaults below cover the dashboard's documented codes; installations can
/// override any set from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusClassification {
    pub approved: HashSet<u32>,
    pub rejected: HashSet<u32>,
    pub refunded: HashSet<u32>,
    pub in_review: HashSet<u32>,
    pub pending: HashSet<u32>,
    pub cancelled: HashSet<u32>,
}

impl Default for StatusClassification {
    fn default() -> Self {
        Self {
            pending: [0, 1, 2, 100].into(),
            in_review: [3, 4].into(),
            approved: [200, 210, 300].into(),
            rejected: [400, 401, 402, 410, 411].into(),
            cancelled: [601, 603, 610, 661].into(),
            refunded: [602, 605].into(),
        }
    }
}

/// Classifies gateway status codes into domain statuses.
#[derive(Clone, Debug)]
pub struct StatusResolver {
    table: StatusClassification,
}

impl StatusResolver {
    pub fn new(table: StatusClassification) -> Self {
        Self { table }
    }

    /// Maps a gateway status code onto a [`DomainStatus`].
    ///
    /// A code that appears in none of the configured sets resolves to [`DomainStatus::Pending`]; an unrecognised
    /// code must never be treated as a success.
    pub fn classify(&self, status_code: u32) -> DomainStatus {
        let t = &self.table;
        if t.refunded.contains(&status_code) {
            DomainStatus::Refunded
        } else if t.approved.contains(&status_code) {
            DomainStatus::Approved
        } else if t.rejected.contains(&status_code) {
            DomainStatus::Rejected
        } else if t.in_review.contains(&status_code) {
            DomainStatus::InReview
        } else if t.cancelled.contains(&status_code) {
            DomainStatus::Cancelled
        } else {
            DomainStatus::Pending
        }
    }

    /// A narrower check than [`Self::classify`]: refund handling pre-empts normal reconciliation regardless of the
    /// parent/child flag, so the reconciler asks this question first.
    pub fn is_refund_code(&self, status_code: u32) -> bool {
        self.table.refunded.contains(&status_code)
    }
}

impl Default for StatusResolver {
    fn default() -> Self {
        Self::new(StatusClassification::default())
    }
}
