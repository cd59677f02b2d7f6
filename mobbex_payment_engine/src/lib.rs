//! Mobbex Payment Engine
//!
//! The engine is the reconciliation core behind the Mobbex webhook gateway. It receives typed payment notifications
//! (already authenticated and parsed by the server crate), persists an immutable audit record for every delivery, and
//! applies the notification's effects to the order aggregate exactly once per meaningful financial effect, even when
//! deliveries are duplicated, retried, or split across parent and child sub-transactions.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`mod@traits`] and the SQLite implementation behind the `sqlite` feature). The [`traits::OrderStore`]
//!    and [`traits::TransactionStore`] traits describe everything the engine needs from a backend; every
//!    read-modify-write on an order runs inside a single database transaction so that concurrent deliveries for the
//!    same order serialise cleanly.
//! 2. The reconciliation API ([`ReconcileApi`]), which implements the webhook state machine: token validation, refund
//!    pre-emption, child-transaction annotation and the full parent reconciliation flow.
//! 3. Events ([`mod@events`]). After a parent notification has been fully reconciled, a
//!    [`events::WebhookProcessedEvent`] is published to any number of subscribers. Delivery is best-effort and never
//!    affects the webhook's own outcome.
pub mod db_types;
pub mod events;
pub mod helpers;
mod mpe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use mpe_api::{
    errors::ReconcileError,
    reconcile_api::ReconcileApi,
    reconcile_objects::ReconcileOutcome,
    status_resolver::{StatusClassification, StatusResolver},
};
