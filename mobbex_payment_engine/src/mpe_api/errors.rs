use thiserror::Error;

use crate::{db_types::OrderId, traits::StoreError};

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    #[error("{0}")]
    StoreError(#[from] StoreError),
    #[error("The refund for order {0} could not be created. {1}")]
    RefundFailed(OrderId, String),
}
