use sqlx::SqliteConnection;

use crate::db_types::{NewTransaction, OrderId, TransactionRecord};

/// Appends a delivery record to the audit trail, returning the assigned delivery id.
///
/// This is an INSERT and nothing else; the table carries no UPDATE or DELETE paths anywhere in the crate.
pub async fn insert_transaction(tx: &NewTransaction, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let installment = tx.source.installment.as_ref();
    let (id,): (i64,) = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                order_id,
                payment_id,
                status_code,
                status_message,
                total,
                is_parent,
                entity_uid,
                risk_score,
                source_name,
                source_kind,
                source_number,
                installment_description,
                installment_count,
                installment_amount,
                raw_payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id;
        "#,
    )
    .bind(tx.order_id.as_str())
    .bind(&tx.payment_id)
    .bind(tx.status_code)
    .bind(&tx.status_message)
    .bind(tx.total.value())
    .bind(tx.is_parent)
    .bind(&tx.entity_uid)
    .bind(tx.risk_score)
    .bind(&tx.source.name)
    .bind(&tx.source.kind)
    .bind(&tx.source.masked_number)
    .bind(installment.map(|i| i.description.as_str()))
    .bind(installment.map(|i| i.count))
    .bind(installment.map(|i| i.amount.value()))
    .bind(tx.raw_payload.to_string())
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_transactions_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    let records = sqlx::query_as("SELECT * FROM transactions WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(records)
}
