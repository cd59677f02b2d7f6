//! Storage traits for the payment engine.
//!
//! Backends implement [`OrderStore`] (the order aggregate, the sole source of truth for order state) and
//! [`TransactionStore`] (the append-only webhook audit trail). The engine never caches order state across requests;
//! every operation goes back to the store, and every mutating operation is a single atomic read-modify-write so that
//! concurrent deliveries for the same order serialise.
mod data_objects;
mod order_store;
mod transaction_store;

pub use data_objects::{OrderAnnotation, TotalReconciliation};
pub use order_store::{OrderStore, StoreError};
pub use transaction_store::TransactionStore;
