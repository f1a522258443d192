use am_common::currency::CurrencyError;
use chrono::Duration;
use decimal_percentage::Percentage;
use thiserror::Error;

use crate::{
    db_types::{ItemType, NewOrder, Order, OrderStatusType},
    order_objects::FullOrder,
    traits::{data_objects::ExpiryResult, OrderManagement, OrderQueryError},
};

/// This trait defines the highest level of behaviour for backends supporting the Aula Market engine.
///
/// This behaviour includes:
/// * Creating orders from a cart, with catalog price snapshots and seat reservations.
/// * Attaching and confirming payment intents.
/// * Order fulfilment and its reversal (refunds).
/// * Cancelling and bulk-expiring unpaid orders.
///
/// Every method runs in a single atomic transaction and appends a row to the order audit log.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Takes a new order and, in a single atomic transaction:
    /// * validates the user and every cart line against the catalog,
    /// * snapshots unit prices and titles (prices supplied by clients are never trusted),
    /// * totals the cart and applies `tax_rate` with half-up rounding at the cent,
    /// * reserves seats for event lines, failing the whole order if too few are left,
    /// * stores the order, its items and any bookings.
    ///
    /// Returns the stored order with its line items.
    async fn insert_order(&self, order: NewOrder, tax_rate: Percentage) -> Result<FullOrder, MarketDbError>;

    /// Attaches a payment provider intent to a `pending` order and moves it to `payment_pending`.
    ///
    /// An order can only ever hold one intent. Attaching to an order that already has one is a
    /// conflict, as is reusing an intent id that is attached to another order.
    async fn attach_payment_intent(&self, order_id: i64, intent_id: &str) -> Result<Order, MarketDbError>;

    /// Records a successful payment for the order holding the given intent and moves it from
    /// `payment_pending` to `paid`. The order is looked up by intent id, since that is all the
    /// payment provider's webhook knows.
    async fn confirm_payment(&self, intent_id: &str) -> Result<Order, MarketDbError>;

    /// Fulfils a `paid` order and moves it to `completed`, stamping `completed_at`.
    ///
    /// Side effects per line item:
    /// * course: the enrollment row is created (idempotently) and `enrollment_count` goes up;
    /// * product: `download_count` goes up by the quantity;
    /// * event: the order's seat bookings flip from `pending` to `confirmed`.
    async fn fulfill_order(&self, order_id: i64) -> Result<Order, MarketDbError>;

    /// Cancels a `pending` or `payment_pending` order. Seat bookings are cancelled and their
    /// seats returned to the event, capped at its capacity.
    async fn cancel_order(&self, order_id: i64, reason: &str) -> Result<Order, MarketDbError>;

    /// Refunds a `paid` or `completed` order.
    ///
    /// If the order was fulfilled, fulfilment is reversed exactly: enrollment rows are removed
    /// and `enrollment_count` drops, `download_count` drops by the quantity (never below zero),
    /// and bookings are cancelled with their seats released.
    async fn refund_order(&self, order_id: i64, reason: &str) -> Result<Order, MarketDbError>;

    /// Cancels stale unpaid orders in bulk.
    ///
    /// Any `pending` order that has not been _updated_ (based on the `updated_at` field) for
    /// longer than `pending_limit`, and any `payment_pending` order idle for longer than
    /// `unpaid_limit`, is cancelled and its seats released.
    ///
    /// Typical values for the `pending_limit` are 2 hours, and for the `unpaid_limit` 48 hours.
    ///
    /// The result lists the orders that were expired.
    async fn expire_old_orders(&self, pending_limit: Duration, unpaid_limit: Duration)
        -> Result<ExpiryResult, MarketDbError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), MarketDbError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MarketDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The order has no items")]
    EmptyCart,
    #[error("Invalid quantity {quantity} for {item_type} {item_id}")]
    InvalidQuantity { item_type: ItemType, item_id: i64, quantity: i64 },
    #[error("All items in an order must use one currency. Expected {expected}, found {actual}")]
    CurrencyMismatch { expected: String, actual: String },
    #[error("Event {event_id} does not have {requested} spots left")]
    InsufficientCapacity { event_id: i64, requested: i64 },
    #[error("An order cannot move from {from} to {to}")]
    IllegalStatusChange { from: OrderStatusType, to: OrderStatusType },
    #[error("The order is already {0}")]
    StatusChangeNoOp(OrderStatusType),
    #[error("The requested user {0} does not exist")]
    UserNotFound(i64),
    #[error("There is no published {item_type} with id {item_id}")]
    ItemNotFound { item_type: ItemType, item_id: i64 },
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Payment intent conflict. {0}")]
    PaymentIntentConflict(String),
    #[error("No order holds the payment intent {0}")]
    PaymentIntentNotFound(String),
    #[error("Monetary arithmetic failed. {0}")]
    Arithmetic(#[from] CurrencyError),
}

impl From<sqlx::Error> for MarketDbError {
    fn from(e: sqlx::Error) -> Self {
        MarketDbError::DatabaseError(e.to_string())
    }
}

impl From<OrderQueryError> for MarketDbError {
    fn from(e: OrderQueryError) -> Self {
        match e {
            OrderQueryError::DatabaseError(e) => MarketDbError::DatabaseError(e),
            OrderQueryError::QueryError(e) => MarketDbError::DatabaseError(e),
        }
    }
}
