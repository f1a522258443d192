use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{AuditEntry, AuditEvent};

/// Appends a row to the order audit log. `detail` is stored as a JSON string.
pub async fn insert_audit_entry(
    order_id: i64,
    event: AuditEvent,
    detail: serde_json::Value,
    conn: &mut SqliteConnection,
) -> Result<AuditEntry, sqlx::Error> {
    let entry: AuditEntry = sqlx::query_as(
        r#"
            INSERT INTO order_audit_log (order_id, event, detail) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(event.to_string())
    .bind(detail.to_string())
    .fetch_one(conn)
    .await?;
    trace!("📝️ Audit: {} recorded for order #{order_id}", entry.event);
    Ok(entry)
}

pub async fn fetch_audit_log_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<AuditEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM order_audit_log WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
