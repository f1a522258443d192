use am_common::Cents;
use chrono::Duration;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrderItem, Order, OrderItem, OrderStatusType},
    order_objects::{OrderQueryFilter, Pagination},
    traits::MarketDbError,
};

/// Inserts a new order row with `pending` status. This is not atomic on its own. Callers embed it in a transaction
/// together with [`insert_order_item`] calls, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(
    user_id: i64,
    currency: &str,
    subtotal: Cents,
    tax: Cents,
    total: Cents,
    conn: &mut SqliteConnection,
) -> Result<Order, MarketDbError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (user_id, status, currency, subtotal, tax, total)
            VALUES ($1, 'pending', $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(currency)
    .bind(subtotal.value())
    .bind(tax.value())
    .bind(total.value())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order for user {user_id} inserted with id {}", order.id);
    Ok(order)
}

/// Inserts one line of an order. `title` and `price` are the catalog snapshot taken by the caller.
pub async fn insert_order_item(
    order_id: i64,
    item: &NewOrderItem,
    title: &str,
    price: Cents,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, MarketDbError> {
    let item: OrderItem = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, item_type, item_id, title, price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.item_type.to_string())
    .bind(item.item_id)
    .bind(title)
    .bind(price.value())
    .bind(item.quantity)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the order holding the given payment intent, if any. The column is unique, so there is at most one.
pub async fn fetch_order_by_payment_intent(
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_intent_id = $1")
        .bind(intent_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Fetches one page of a user's order history, newest order first. Ties on `created_at` (common with
/// second-resolution timestamps) are broken by id, so the ordering is stable across pages.
pub async fn fetch_orders_for_user(
    user_id: i64,
    page: &Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders =
        sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3")
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(conn)
            .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(currency) = query.currency {
        where_clause.push("currency=");
        where_clause.push_bind_unseparated(currency);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("Result of fetch_orders: {:?}", orders.len());
    Ok(orders)
}

pub(crate) async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, MarketDbError> {
    let status = status.to_string();
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(MarketDbError::OrderNotFound(id))
}

/// Stores the payment intent against the order and moves it to `payment_pending`. The caller has already checked
/// that the order is `pending` and that neither side of the attachment is in use.
pub(crate) async fn set_payment_intent(
    id: i64,
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Order, MarketDbError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET payment_intent_id = $1, status = 'payment_pending', updated_at = CURRENT_TIMESTAMP WHERE \
         id = $2 RETURNING *",
    )
    .bind(intent_id)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    result.ok_or(MarketDbError::OrderNotFound(id))
}

pub(crate) async fn mark_paid(intent_id: &str, conn: &mut SqliteConnection) -> Result<Order, MarketDbError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = 'paid', updated_at = CURRENT_TIMESTAMP WHERE payment_intent_id = $1 RETURNING *",
    )
    .bind(intent_id)
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| MarketDbError::PaymentIntentNotFound(intent_id.to_string()))
}

/// Moves the order to `completed` and stamps `completed_at`.
pub(crate) async fn mark_completed(id: i64, conn: &mut SqliteConnection) -> Result<Order, MarketDbError> {
    let result: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = 'completed', updated_at = CURRENT_TIMESTAMP, completed_at = CURRENT_TIMESTAMP \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    result.ok_or(MarketDbError::OrderNotFound(id))
}

/// Cancels, in bulk, every order in the given status that has been idle for longer than `limit`, returning the
/// affected rows. Idleness is measured against `updated_at`, so any touch of the order resets its clock.
pub(crate) async fn expire_orders(
    status: OrderStatusType,
    limit: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, MarketDbError> {
    let rows = sqlx::query_as(
        format!(
            "UPDATE orders SET updated_at = CURRENT_TIMESTAMP, status = 'cancelled' WHERE status = '{status}' AND \
             (unixepoch(CURRENT_TIMESTAMP) - unixepoch(updated_at)) > {} RETURNING *;",
            limit.num_seconds()
        )
        .as_str(),
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
