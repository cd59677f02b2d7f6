//! # Mobbex webhook gateway server
//! This crate hosts the HTTP boundary of the gateway. It is responsible for:
//! Listening for incoming webhook notifications from Mobbex.
//! Authenticating each delivery against the installation's webhook token.
//! Persisting the delivery to the audit trail and handing it to the reconciliation engine.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook`: The webhook route for receiving payment notifications from Mobbex.
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod mobbex_notification;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
