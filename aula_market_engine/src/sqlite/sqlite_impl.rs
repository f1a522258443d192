//! `SqliteDatabase` is a concrete implementation of an Aula Market engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use am_common::{currency::tax_amount, Cents, Locale};
use chrono::Duration;
use decimal_percentage::Percentage;
use log::*;
use serde_json::json;
use sqlx::{SqliteConnection, SqlitePool};

use super::db::{audit, bookings, catalog, db_url, new_pool, orders, progress, users};
use crate::{
    db_types::{
        AuditEntry,
        AuditEvent,
        Booking,
        Course,
        EventListing,
        ItemType,
        NewCourse,
        NewEventListing,
        NewOrder,
        NewProduct,
        NewUser,
        Order,
        OrderItem,
        OrderStatusType,
        Product,
        User,
    },
    order_objects::{FullOrder, OrderQueryFilter, Pagination},
    traits::{
        CatalogApiError,
        CatalogManagement,
        ExpiryResult,
        MarketDbError,
        MarketplaceDatabase,
        OrderManagement,
        OrderQueryError,
        ProfileApiError,
        UserManagement,
    },
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

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Takes a new order, and in a single atomic transaction,
    /// * verifies that the user placing the order exists
    /// * checks that every cart line points at a published listing, carries a sane quantity, and shares one currency
    /// * snapshots the title and unit price of every line from the catalog
    /// * totals the cart and applies the tax rate
    /// * reserves seats, and creates a pending booking, for every event line
    /// * stores the order with `pending` status and writes an `order_created` audit entry
    /// Returns the stored order together with its line items.
    async fn insert_order(&self, order: NewOrder, tax_rate: Percentage) -> Result<FullOrder, MarketDbError> {
        let mut tx = self.pool.begin().await?;
        let _ = users::fetch_user_by_id(order.user_id, &mut tx)
            .await?
            .ok_or(MarketDbError::UserNotFound(order.user_id))?;
        if order.items.is_empty() {
            return Err(MarketDbError::EmptyCart);
        }
        let mut currency: Option<String> = None;
        let mut lines = Vec::with_capacity(order.items.len());
        for item in &order.items {
            if item.quantity <= 0 || (item.item_type == ItemType::Course && item.quantity != 1) {
                return Err(MarketDbError::InvalidQuantity {
                    item_type: item.item_type,
                    item_id: item.item_id,
                    quantity: item.quantity,
                });
            }
            let not_found = MarketDbError::ItemNotFound { item_type: item.item_type, item_id: item.item_id };
            let (title, price, item_currency) = match item.item_type {
                ItemType::Course => {
                    let course =
                        catalog::fetch_course(item.item_id, &mut tx).await?.filter(|c| c.published).ok_or(not_found)?;
                    (course.title, course.price, course.currency)
                },
                ItemType::Product => {
                    let product = catalog::fetch_product(item.item_id, &mut tx)
                        .await?
                        .filter(|p| p.published)
                        .ok_or(not_found)?;
                    (product.title, product.price, product.currency)
                },
                ItemType::Event => {
                    let event = catalog::fetch_event_listing(item.item_id, &mut tx)
                        .await?
                        .filter(|e| e.published)
                        .ok_or(not_found)?;
                    (event.title, event.price, event.currency)
                },
            };
            match &currency {
                Some(c) if *c != item_currency => {
                    return Err(MarketDbError::CurrencyMismatch { expected: c.clone(), actual: item_currency });
                },
                Some(_) => {},
                None => currency = Some(item_currency),
            }
            lines.push((item, title, price));
        }
        let currency = currency.ok_or(MarketDbError::EmptyCart)?;
        let subtotal: Cents = lines.iter().map(|(item, _, price)| *price * item.quantity).sum();
        let tax = tax_amount(subtotal, tax_rate)?;
        let total = subtotal + tax;
        let db_order = orders::insert_order(order.user_id, &currency, subtotal, tax, total, &mut tx).await?;
        let mut items = Vec::with_capacity(lines.len());
        for (item, title, price) in lines {
            let stored = orders::insert_order_item(db_order.id, item, &title, price, &mut tx).await?;
            if item.item_type == ItemType::Event {
                let reserved = catalog::reserve_spots(item.item_id, item.quantity, &mut tx).await?;
                if !reserved {
                    return Err(MarketDbError::InsufficientCapacity {
                        event_id: item.item_id,
                        requested: item.quantity,
                    });
                }
                let _ = bookings::insert_booking(item.item_id, order.user_id, db_order.id, item.quantity, &mut tx)
                    .await?;
                trace!("🗃️ {} seat(s) of event #{} held for order #{}", item.quantity, item.item_id, db_order.id);
            }
            items.push(stored);
        }
        let detail = json!({ "total": db_order.total, "currency": db_order.currency, "items": items.len() });
        audit::insert_audit_entry(db_order.id, AuditEvent::OrderCreated, detail, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order #{} has been saved in the DB. {} {} across {} item(s)",
            db_order.id,
            db_order.total,
            db_order.currency,
            items.len()
        );
        Ok(FullOrder::new(db_order, items))
    }

    /// Attaches a payment provider intent to an order. In a single atomic transaction,
    /// * the order must exist and be in `pending` status
    /// * the order must not already hold an intent, and the intent must not be attached to another order
    /// * the order moves to `payment_pending` and a `payment_attached` audit entry is written
    async fn attach_payment_intent(&self, order_id: i64, intent_id: &str) -> Result<Order, MarketDbError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(MarketDbError::OrderNotFound(order_id))?;
        if let Some(existing) = &order.payment_intent_id {
            info!("🗃️ Order #{order_id} already holds payment intent [{existing}]. Request denied.");
            return Err(MarketDbError::PaymentIntentConflict(existing.clone()));
        }
        if order.status != OrderStatusType::Pending {
            return Err(MarketDbError::IllegalStatusChange { from: order.status, to: OrderStatusType::PaymentPending });
        }
        if let Some(holder) = orders::fetch_order_by_payment_intent(intent_id, &mut tx).await? {
            info!("🗃️ Payment intent [{intent_id}] is already attached to order #{}. Request denied.", holder.id);
            return Err(MarketDbError::PaymentIntentConflict(intent_id.to_string()));
        }
        let order = orders::set_payment_intent(order_id, intent_id, &mut tx).await?;
        let detail = json!({ "payment_intent_id": intent_id });
        audit::insert_audit_entry(order_id, AuditEvent::PaymentAttached, detail, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment intent [{intent_id}] attached to order #{order_id}");
        Ok(order)
    }

    /// Records a successful payment against the order holding `intent_id`. Confirming an already `paid` order is a
    /// no-op error rather than an illegal transition, so that a replayed provider webhook is recognisable as
    /// harmless.
    async fn confirm_payment(&self, intent_id: &str) -> Result<Order, MarketDbError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_payment_intent(intent_id, &mut tx)
            .await?
            .ok_or_else(|| MarketDbError::PaymentIntentNotFound(intent_id.to_string()))?;
        if order.status == OrderStatusType::Paid {
            debug!("🗃️ Order #{} is already paid. No action to take", order.id);
            return Err(MarketDbError::StatusChangeNoOp(OrderStatusType::Paid));
        }
        if order.status != OrderStatusType::PaymentPending {
            return Err(MarketDbError::IllegalStatusChange { from: order.status, to: OrderStatusType::Paid });
        }
        let order = orders::mark_paid(intent_id, &mut tx).await?;
        let detail = json!({ "payment_intent_id": intent_id });
        audit::insert_audit_entry(order.id, AuditEvent::PaymentConfirmed, detail, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} marked as paid via intent [{intent_id}]", order.id);
        Ok(order)
    }

    /// Fulfils a `paid` order in a single atomic transaction. For each line,
    /// * course: the user is enrolled (idempotently) and the course's enrollment counter goes up if a new
    ///   enrollment was created
    /// * product: the product's download counter goes up by the line quantity
    /// * event: nothing extra; the seat hold from order creation is confirmed below
    /// All pending bookings flip to `confirmed`, the order moves to `completed` with `completed_at` stamped, and an
    /// `order_completed` audit entry is written.
    async fn fulfill_order(&self, order_id: i64) -> Result<Order, MarketDbError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(MarketDbError::OrderNotFound(order_id))?;
        if order.status != OrderStatusType::Paid {
            return Err(MarketDbError::IllegalStatusChange { from: order.status, to: OrderStatusType::Completed });
        }
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        for item in &items {
            match item.item_type {
                ItemType::Course => {
                    let enrolled = progress::start_course(order.user_id, item.item_id, &mut tx).await?;
                    if enrolled {
                        catalog::adjust_enrollment(item.item_id, 1, &mut tx).await?;
                        trace!("🗃️ User {} enrolled in course #{}", order.user_id, item.item_id);
                    }
                },
                ItemType::Product => {
                    catalog::adjust_downloads(item.item_id, item.quantity, &mut tx).await?;
                },
                ItemType::Event => {},
            }
        }
        let confirmed = bookings::confirm_bookings_for_order(order_id, &mut tx).await?;
        trace!("🗃️ {} booking(s) confirmed for order #{order_id}", confirmed.len());
        let order = orders::mark_completed(order_id, &mut tx).await?;
        let detail = json!({ "items": items.len() });
        audit::insert_audit_entry(order_id, AuditEvent::OrderCompleted, detail, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} fulfilled and marked as completed");
        Ok(order)
    }

    /// Cancels an unpaid order (`pending` or `payment_pending`). Every live seat hold is released back to its
    /// event, the order moves to `cancelled`, and an `order_cancelled` audit entry records the reason.
    async fn cancel_order(&self, order_id: i64, reason: &str) -> Result<Order, MarketDbError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(MarketDbError::OrderNotFound(order_id))?;
        if order.status == OrderStatusType::Cancelled {
            return Err(MarketDbError::StatusChangeNoOp(OrderStatusType::Cancelled));
        }
        if !matches!(order.status, OrderStatusType::Pending | OrderStatusType::PaymentPending) {
            return Err(MarketDbError::IllegalStatusChange { from: order.status, to: OrderStatusType::Cancelled });
        }
        release_order_bookings(order_id, &mut tx).await?;
        let order = orders::update_order_status(order_id, OrderStatusType::Cancelled, &mut tx).await?;
        audit::insert_audit_entry(order_id, AuditEvent::OrderCancelled, json!({ "reason": reason }), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} cancelled. Reason: {reason}");
        Ok(order)
    }

    /// Refunds a `paid` or `completed` order in a single atomic transaction. Fulfillment is reversed first:
    /// * course: the enrollment row for (user, course) is removed, decrementing the course's enrollment counter if
    ///   a row was actually removed
    /// * product: the download counter drops by the line quantity, flooring at zero
    /// * event: every live seat hold is released back to the event
    /// The order then moves to `refunded` and an `order_refunded` audit entry records the reason.
    async fn refund_order(&self, order_id: i64, reason: &str) -> Result<Order, MarketDbError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(MarketDbError::OrderNotFound(order_id))?;
        if order.status == OrderStatusType::Refunded {
            return Err(MarketDbError::StatusChangeNoOp(OrderStatusType::Refunded));
        }
        if !matches!(order.status, OrderStatusType::Paid | OrderStatusType::Completed) {
            return Err(MarketDbError::IllegalStatusChange { from: order.status, to: OrderStatusType::Refunded });
        }
        if order.status == OrderStatusType::Completed {
            let items = orders::fetch_order_items(order_id, &mut tx).await?;
            for item in &items {
                match item.item_type {
                    ItemType::Course => {
                        let removed = progress::delete_progress(order.user_id, item.item_id, &mut tx).await?;
                        if removed {
                            catalog::adjust_enrollment(item.item_id, -1, &mut tx).await?;
                            trace!("🗃️ User {} unenrolled from course #{}", order.user_id, item.item_id);
                        }
                    },
                    ItemType::Product => {
                        catalog::adjust_downloads(item.item_id, -item.quantity, &mut tx).await?;
                    },
                    ItemType::Event => {},
                }
            }
        }
        release_order_bookings(order_id, &mut tx).await?;
        let order = orders::update_order_status(order_id, OrderStatusType::Refunded, &mut tx).await?;
        audit::insert_audit_entry(order_id, AuditEvent::OrderRefunded, json!({ "reason": reason }), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} refunded. Reason: {reason}");
        Ok(order)
    }

    /// Runs the expiry sweep in a single atomic transaction. `pending` orders idle for longer than `pending_limit`
    /// and `payment_pending` orders idle for longer than `unpaid_limit` are cancelled in bulk, their seat holds are
    /// released, and each one gets an `order_expired` audit entry.
    async fn expire_old_orders(
        &self,
        pending_limit: Duration,
        unpaid_limit: Duration,
    ) -> Result<ExpiryResult, MarketDbError> {
        let mut tx = self.pool.begin().await?;
        let pending = orders::expire_orders(OrderStatusType::Pending, pending_limit, &mut tx).await?;
        let unpaid = orders::expire_orders(OrderStatusType::PaymentPending, unpaid_limit, &mut tx).await?;
        for order in &pending {
            release_order_bookings(order.id, &mut tx).await?;
            let detail = json!({ "expired_from": "pending" });
            audit::insert_audit_entry(order.id, AuditEvent::OrderExpired, detail, &mut tx).await?;
        }
        for order in &unpaid {
            release_order_bookings(order.id, &mut tx).await?;
            let detail = json!({ "expired_from": "payment_pending" });
            audit::insert_audit_entry(order.id, AuditEvent::OrderExpired, detail, &mut tx).await?;
        }
        tx.commit().await?;
        if !pending.is_empty() || !unpaid.is_empty() {
            info!(
                "🗃️ Expiry sweep cancelled {} pending and {} payment_pending order(s)",
                pending.len(),
                unpaid.len()
            );
        }
        Ok(ExpiryResult::new(pending, unpaid))
    }

    async fn close(&mut self) -> Result<(), MarketDbError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_id(&self, order_id: i64) -> Result<Option<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_payment_intent(intent_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_orders_for_user(&self, user_id: i64, page: Pagination) -> Result<Vec<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &page, &mut conn).await?;
        Ok(orders)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_bookings_for_order(&self, order_id: i64) -> Result<Vec<Booking>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let bookings = bookings::fetch_bookings_for_order(order_id, &mut conn).await?;
        Ok(bookings)
    }

    async fn fetch_audit_log_for_order(&self, order_id: i64) -> Result<Vec<AuditEntry>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let entries = audit::fetch_audit_log_for_order(order_id, &mut conn).await?;
        Ok(entries)
    }
}

impl UserManagement for SqliteDatabase {
    /// The duplicate-email check and the insert run in one transaction, so two concurrent registrations for the
    /// same address cannot both succeed.
    async fn insert_user(&self, user: NewUser) -> Result<User, ProfileApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, ProfileApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, ProfileApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_email(email, &mut conn).await?;
        Ok(user)
    }

    async fn update_preferred_language(&self, user_id: i64, language: Locale) -> Result<User, ProfileApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::update_preferred_language(user_id, language, &mut conn).await?;
        debug!("🗃️ User #{user_id} language preference set to {language}");
        Ok(user)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_course(&self, course: NewCourse) -> Result<Course, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_course(course, &mut conn).await
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_product(product, &mut conn).await
    }

    async fn insert_event_listing(&self, listing: NewEventListing) -> Result<EventListing, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_event_listing(listing, &mut conn).await
    }

    async fn fetch_course(&self, course_id: i64) -> Result<Option<Course>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let course = catalog::fetch_course(course_id, &mut conn).await?;
        Ok(course)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = catalog::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_event_listing(&self, event_id: i64) -> Result<Option<EventListing>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let event = catalog::fetch_event_listing(event_id, &mut conn).await?;
        Ok(event)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
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

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Cancels the order's live bookings and hands their seats back to the events. Runs inside the caller's
/// transaction.
async fn release_order_bookings(order_id: i64, conn: &mut SqliteConnection) -> Result<(), MarketDbError> {
    let released = bookings::cancel_bookings_for_order(order_id, conn).await?;
    for booking in &released {
        catalog::release_spots(booking.event_id, booking.seats, conn).await?;
        trace!("🗃️ Returned {} seat(s) to event #{}", booking.seats, booking.event_id);
    }
    Ok(())
}
