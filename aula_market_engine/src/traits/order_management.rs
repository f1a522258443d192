use thiserror::Error;

use crate::{
    db_types::{AuditEntry, Booking, Order, OrderItem},
    order_objects::{OrderQueryFilter, Pagination},
};

#[derive(Debug, Clone, Error)]
pub enum OrderQueryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderQueryError {
    fn from(e: sqlx::Error) -> Self {
        OrderQueryError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the read side of the order store: fetching single orders,
/// their line items, bookings and audit trail, and running filtered searches.
///
/// The [`super::MarketplaceDatabase`] trait handles the actual machinery of creating orders and
/// moving them through their lifecycle. `OrderManagement` only answers questions.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given id. If no order exists, `None` is returned.
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderQueryError>;

    /// Fetches the order that the given payment intent was attached to, if any.
    async fn fetch_order_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>, OrderQueryError>;

    /// Fetches the line items for an order, in insertion order.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderQueryError>;

    /// Fetches a page of a user's orders, newest first.
    async fn fetch_orders_for_user(&self, user_id: i64, page: Pagination) -> Result<Vec<Order>, OrderQueryError>;

    /// Fetches orders matching the filter, in ascending `created_at` order.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError>;

    /// Fetches the seat bookings attached to an order.
    async fn fetch_bookings_for_order(&self, order_id: i64) -> Result<Vec<Booking>, OrderQueryError>;

    /// Fetches the audit trail for an order, oldest entry first.
    async fn fetch_audit_log_for_order(&self, order_id: i64) -> Result<Vec<AuditEntry>, OrderQueryError>;
}
