//! `SqliteDatabase` is a concrete storage backend for the Mobbex payment engine.
//!
//! Unsurprisingly, it uses SQLite, and implements the [`OrderStore`] and [`TransactionStore`] traits.
//!
//! Every mutating method on the order aggregate opens its own transaction and performs the read-modify-write inside
//! it. SQLite allows a single writer at a time, so concurrent webhook deliveries for the same order serialise here;
//! in particular, the `payment_completed` and `total_reconciled` guards are checked and set under the same
//! transaction that observes them.
use std::fmt::Debug;

use log::*;
use mwg_common::Money;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, orders, transactions};
use crate::{
    db_types::{DomainStatus, LineItem, NewOrder, NewTransaction, Order, OrderId, TransactionRecord},
    traits::{OrderAnnotation, OrderStore, StoreError, TotalReconciliation, TransactionStore},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderStore for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn annotate_order(&self, order_id: &OrderId, annotation: OrderAnnotation) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        for (key, value) in &annotation.metadata {
            orders::upsert_metadata(order_id, key, value, &mut tx).await?;
        }
        for note in &annotation.notes {
            orders::append_note(order_id, note, &mut tx).await?;
        }
        if let Some(title) = &annotation.payment_method {
            orders::set_payment_method(order_id, title, &mut tx).await?;
        }
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {order_id} annotated with {} metadata entries and {} notes",
            annotation.metadata.len(),
            annotation.notes.len()
        );
        Ok(order)
    }

    async fn set_order_status(
        &self,
        order_id: &OrderId,
        status: DomainStatus,
        message: &str,
    ) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_status(order_id, status, message, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} status set to {status} ({message})");
        Ok(order)
    }

    async fn complete_payment(&self, order_id: &OrderId, payment_ref: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        if order.payment_completed {
            debug!("🗃️ Order {order_id} payment was already completed. Nothing to do");
            tx.commit().await?;
            return Ok(false);
        }
        let completed = orders::mark_payment_completed(order_id, payment_ref, &mut tx).await?;
        tx.commit().await?;
        if completed {
            info!("🗃️ Order {order_id} payment completed with reference [{payment_ref}]");
        }
        Ok(completed)
    }

    async fn reconcile_total(
        &self,
        order_id: &OrderId,
        notified_total: Money,
    ) -> Result<TotalReconciliation, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        let outcome = if order.total == notified_total || order.total_reconciled {
            trace!("🗃️ Order {order_id} total needs no adjustment");
            TotalReconciliation::Unchanged
        } else {
            let delta = notified_total - order.total;
            let label = if delta.is_positive() { "Financial surcharge" } else { "Discount" };
            orders::add_line_item(order_id, label, delta, &mut tx).await?;
            orders::mark_total_reconciled(order_id, &mut tx).await?;
            debug!("🗃️ Order {order_id}: {label} line item of {delta} recorded");
            TotalReconciliation::Adjusted { delta }
        };
        orders::set_total(order_id, notified_total, &mut tx).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn add_note(&self, order_id: &OrderId, note: &str) -> Result<i64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let id = orders::append_note(order_id, note, &mut conn).await?;
        Ok(id)
    }

    async fn create_refund(&self, order_id: &OrderId, amount: Money) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;
        orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        let id = orders::insert_refund(order_id, amount, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Refund #{id} of {amount} recorded against order {order_id}");
        Ok(id)
    }

    async fn fetch_notes(&self, order_id: &OrderId) -> Result<Vec<String>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let notes = orders::fetch_notes(order_id, &mut conn).await?;
        Ok(notes)
    }

    async fn fetch_metadata(&self, order_id: &OrderId, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let value = orders::fetch_metadata_value(order_id, key, &mut conn).await?;
        Ok(value)
    }

    async fn fetch_line_items(&self, order_id: &OrderId) -> Result<Vec<LineItem>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_line_items(order_id, &mut conn).await?;
        Ok(items)
    }
}

impl TransactionStore for SqliteDatabase {
    async fn append_transaction(&self, tx: NewTransaction) -> Result<i64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let id = transactions::insert_transaction(&tx, &mut conn).await?;
        debug!("🗃️ Delivery record {id} appended for order {} (payment [{}])", tx.order_id, tx.payment_id);
        Ok(id)
    }

    async fn fetch_transactions_for_order(&self, order_id: &OrderId) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let records = transactions::fetch_transactions_for_order(order_id, &mut conn).await?;
        Ok(records)
    }
}
