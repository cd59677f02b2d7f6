use log::debug;
use mwg_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{DomainStatus, LineItem, NewOrder, Order, OrderId},
    traits::StoreError,
};

/// Inserts the order into the database, returning `false` in the second element if the order already exists.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, bool), StoreError> {
    let inserted = match fetch_order_by_order_id(&order.order_id, conn).await? {
        Some(order) => (order, false),
        None => {
            let order = insert_order(order, conn).await?;
            debug!("🗃️ Order {} inserted with id {}", order.order_id, order.id);
            (order, true)
        },
    };
    Ok(inserted)
}

async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, total, created_at)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.total.value())
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Appends a single audit note. Notes are ordered by the autoincrement id and are never edited or reordered.
pub async fn append_note(order_id: &OrderId, note: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO order_notes (order_id, note) VALUES ($1, $2) RETURNING id")
        .bind(order_id.as_str())
        .bind(note)
        .fetch_one(conn)
        .await?;
    Ok(id)
}

pub async fn upsert_metadata(
    order_id: &OrderId,
    key: &str,
    value: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO order_metadata (order_id, key, value) VALUES ($1, $2, $3)
            ON CONFLICT (order_id, key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(order_id.as_str())
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_payment_method(
    order_id: &OrderId,
    title: &str,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET payment_method = $2, updated_at = CURRENT_TIMESTAMP WHERE order_id = $1")
        .bind(order_id.as_str())
        .bind(title)
        .execute(conn)
        .await?;
    Ok(())
}

/// Transitions the order status, storing the gateway's message alongside. Returns the updated order, or `None` if
/// the order does not exist.
pub async fn update_status(
    order_id: &OrderId,
    status: DomainStatus,
    message: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $2, status_message = $3, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(status)
    .bind(message)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Marks the payment as completed iff it was not already. The `payment_completed = 0` guard in the WHERE clause is
/// what makes the transition one-way; the returned row count tells the caller whether this delivery won the race.
pub async fn mark_payment_completed(
    order_id: &OrderId,
    payment_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET payment_completed = 1, payment_ref = $2, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND payment_completed = 0
        "#,
    )
    .bind(order_id.as_str())
    .bind(payment_ref)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn add_line_item(
    order_id: &OrderId,
    label: &str,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO order_line_items (order_id, label, amount) VALUES ($1, $2, $3) RETURNING id")
            .bind(order_id.as_str())
            .bind(label)
            .bind(amount.value())
            .fetch_one(conn)
            .await?;
    Ok(id)
}

pub async fn set_total(order_id: &OrderId, total: Money, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET total = $2, updated_at = CURRENT_TIMESTAMP WHERE order_id = $1")
        .bind(order_id.as_str())
        .bind(total.value())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn mark_total_reconciled(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET total_reconciled = 1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $1")
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn insert_refund(
    order_id: &OrderId,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO refunds (order_id, amount) VALUES ($1, $2) RETURNING id")
        .bind(order_id.as_str())
        .bind(amount.value())
        .fetch_one(conn)
        .await?;
    Ok(id)
}

pub async fn fetch_notes(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<String>, sqlx::Error> {
    let notes: Vec<(String,)> = sqlx::query_as("SELECT note FROM order_notes WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(notes.into_iter().map(|(note,)| note).collect())
}

pub async fn fetch_metadata_value(
    order_id: &OrderId,
    key: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<String>, sqlx::Error> {
    let value: Option<(String,)> =
        sqlx::query_as("SELECT value FROM order_metadata WHERE order_id = $1 AND key = $2")
            .bind(order_id.as_str())
            .bind(key)
            .fetch_optional(conn)
            .await?;
    Ok(value.map(|(v,)| v))
}

pub async fn fetch_line_items(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<LineItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_line_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}
