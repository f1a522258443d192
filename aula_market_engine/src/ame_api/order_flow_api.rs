use std::fmt::Debug;

use log::*;

use crate::{
    ame_api::errors::OrderManagerError,
    config::EngineConfig,
    db_types::{NewOrder, Order, OrderStatusType, User},
    events::{EventProducers, OrderAnnulledEvent, OrderCompletedEvent, OrderPaidEvent},
    order_objects::{FullOrder, OrderQueryFilter, Pagination},
    traits::{ExpiryResult, MarketDbError, MarketplaceDatabase},
};

/// `OrderFlowApi` is the primary API for handling order and payment flows in response to storefront checkout events
/// and payment provider callbacks.
pub struct OrderFlowApi<B> {
    db: B,
    config: EngineConfig,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, config: EngineConfig, producers: EventProducers) -> Self {
        Self { db, config, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Submit a new order to the order manager.
    ///
    /// The cart lines only carry catalog ids and quantities. Titles and unit prices are snapshotted from the catalog
    /// inside the same transaction, the engine's tax rate is applied to the subtotal, and seats are reserved for any
    /// event lines. If anything about the cart is invalid (unknown user, unknown or unpublished item, bad quantity,
    /// mixed currencies, not enough seats left) the whole order is rejected and nothing is stored.
    pub async fn process_new_order(&self, order: NewOrder) -> Result<FullOrder, OrderManagerError> {
        let order = self.db.insert_order(order, self.config.tax_rate).await?;
        debug!(
            "🔄️📦️ Order #{} created for user {} with {} item(s), totalling {} {}",
            order.order.id,
            order.order.user_id,
            order.item_count(),
            order.order.total,
            order.order.currency
        );
        Ok(order)
    }

    /// Fetches an order, with its items, on behalf of `requester`.
    ///
    /// Users may only view their own orders. Admins may view any order. A missing order and a forbidden order are
    /// distinct errors, so callers can return 404 vs 403 as appropriate.
    pub async fn order_by_id(&self, order_id: i64, requester: &User) -> Result<FullOrder, OrderManagerError> {
        let order = self.db.fetch_order_by_id(order_id).await?.ok_or(OrderManagerError::OrderNotFound(order_id))?;
        if order.user_id != requester.id && !requester.is_admin() {
            info!(
                "🔄️🔎️ User {} asked for order #{order_id}, which belongs to user {}. Request denied.",
                requester.id, order.user_id
            );
            return Err(OrderManagerError::Forbidden);
        }
        let items = self.db.fetch_order_items(order_id).await?;
        Ok(FullOrder::new(order, items))
    }

    /// Fetches a page of a user's order history, newest first. The same owner-or-admin rule as
    /// [`Self::order_by_id`] applies.
    pub async fn orders_for_user(
        &self,
        user_id: i64,
        page: Pagination,
        requester: &User,
    ) -> Result<Vec<Order>, OrderManagerError> {
        if user_id != requester.id && !requester.is_admin() {
            return Err(OrderManagerError::Forbidden);
        }
        let orders = self.db.fetch_orders_for_user(user_id, page).await?;
        Ok(orders)
    }

    /// Fetches orders matching the filter. This is the admin/back-office search; it applies no per-user
    /// authorization.
    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderManagerError> {
        trace!("🔄️🔎️ Searching orders: {query}");
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    /// Attaches a payment provider intent to a `pending` order, moving it to `payment_pending`.
    ///
    /// This is the seam where the storefront hands the order over to the payment provider. Each order holds at most
    /// one intent, and an intent belongs to at most one order; violations are conflict errors.
    pub async fn attach_payment_intent(&self, order_id: i64, intent_id: &str) -> Result<Order, OrderManagerError> {
        let order = self.db.attach_payment_intent(order_id, intent_id).await?;
        debug!("🔄️💳️ Payment intent [{intent_id}] attached to order #{order_id}");
        Ok(order)
    }

    /// Records a successful payment, looked up by the provider's intent id.
    ///
    /// The order moves from `payment_pending` to `paid` and the order-paid hook fires. When the engine is configured
    /// to auto-fulfill (the default), fulfilment runs immediately afterwards and the returned order is `completed`.
    pub async fn confirm_payment(&self, intent_id: &str) -> Result<Order, OrderManagerError> {
        let order = self.db.confirm_payment(intent_id).await?;
        trace!("🔄️✅️ Payment intent [{intent_id}] confirmed for order #{}", order.id);
        self.call_order_paid_hook(&order).await;
        let order = if self.config.auto_fulfill { self.complete_order(order.id).await? } else { order };
        debug!("🔄️✅️ Payment [{intent_id}] processing complete. Order #{} is now {}", order.id, order.status);
        Ok(order)
    }

    /// Fulfils a `paid` order: enrollments are created, download counters bumped, seat bookings confirmed, and the
    /// order moves to `completed` with `completed_at` stamped. Fires the order-completed hook.
    pub async fn complete_order(&self, order_id: i64) -> Result<Order, OrderManagerError> {
        let order = self.db.fulfill_order(order_id).await?;
        self.call_order_completed_hook(&order).await;
        debug!("🔄️🎓️ Order #{order_id} fulfilled");
        Ok(order)
    }

    /// Cancels an order that has not been paid yet. Seat reservations are released. Fires the order-annulled hook.
    pub async fn cancel_order(&self, order_id: i64, reason: &str) -> Result<Order, OrderManagerError> {
        let order = self.db.cancel_order(order_id, reason).await?;
        self.call_order_annulled_hook(&order).await;
        debug!("🔄️🚫️ Order #{order_id} cancelled. Reason: {reason}");
        Ok(order)
    }

    /// Refunds a `paid` or `completed` order, reversing any fulfilment. Fires the order-annulled hook.
    pub async fn refund_order(&self, order_id: i64, reason: &str) -> Result<Order, OrderManagerError> {
        let order = self.db.refund_order(order_id, reason).await?;
        self.call_order_annulled_hook(&order).await;
        debug!("🔄️💸️ Order #{order_id} refunded. Reason: {reason}");
        Ok(order)
    }

    /// Changes the status of an order.
    ///
    /// This function has several side effects, depending on the current order status and the new order status. The
    /// results are summarised in this table, with detailed notes provided in the subsequent sections.
    ///
    /// | From \ To       | payment_pending | paid | completed | cancelled | refunded |
    /// |-----------------|-----------------|------|-----------|-----------|----------|
    /// | pending         | Err (1)         | Err  | Err       | 2         | Err      |
    /// | payment_pending | Err             | 3    | Err       | 2         | Err      |
    /// | paid            | Err             | Err  | 4         | Err       | 5        |
    /// | completed       | Err             | Err  | Err       | Err       | 5        |
    /// | cancelled       | Err             | Err  | Err       | Err       | Err      |
    /// | refunded        | Err             | Err  | Err       | Err       | Err      |
    ///
    /// ### (1) Changing from `pending` to `payment_pending`
    ///
    /// This transition needs a payment intent id, which a bare status change does not carry. Use
    /// [`Self::attach_payment_intent`] instead; asking for it here returns an error.
    ///
    /// ### (2) Changing to `cancelled`
    ///
    /// Runs the [`Self::cancel_order`] flow with a generic reason: seat reservations are released and the
    /// order-annulled hook fires. Only unpaid orders can be cancelled; paid orders must be refunded instead.
    ///
    /// ### (3) Changing from `payment_pending` to `paid`
    ///
    /// Usually this change arrives via the payment provider's callback. Asking for it here confirms the order's
    /// attached intent, so it behaves exactly like [`Self::confirm_payment`], including auto-fulfilment when the
    /// engine is configured for it.
    ///
    /// ### (4) Changing from `paid` to `completed`
    ///
    /// Runs the [`Self::complete_order`] fulfilment flow.
    ///
    /// ### (5) Changing to `refunded`
    ///
    /// Runs the [`Self::refund_order`] flow with a generic reason. Fulfilment side effects are reversed.
    ///
    /// ### Changing to `pending`
    ///
    /// Orders never return to `pending`. These changes are forbidden and return an error.
    ///
    /// ### Changing from a status to itself
    ///
    /// This change is a no-op and returns an error.
    ///
    /// ## Returns
    /// The updated order.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
    ) -> Result<Order, OrderManagerError> {
        let order = self.db.fetch_order_by_id(order_id).await?.ok_or(OrderManagerError::OrderNotFound(order_id))?;
        let old_status = order.status;
        use OrderStatusType::*;
        match (old_status, new_status) {
            (old, new) if old == new => Err(MarketDbError::StatusChangeNoOp(old).into()),
            (PaymentPending, Paid) => match &order.payment_intent_id {
                Some(intent_id) => self.confirm_payment(intent_id).await,
                None => Err(MarketDbError::PaymentIntentNotFound(format!("order #{order_id} holds no intent")).into()),
            },
            (Paid, Completed) => self.complete_order(order_id).await,
            (Pending | PaymentPending, Cancelled) => self.cancel_order(order_id, "cancelled by status change").await,
            (Paid | Completed, Refunded) => self.refund_order(order_id, "refunded by status change").await,
            (from, to) => Err(MarketDbError::IllegalStatusChange { from, to }.into()),
        }
    }

    /// Sweeps up stale unpaid orders, cancelling them in bulk using the timeouts from the engine config. The
    /// order-annulled hook fires once per expired order.
    pub async fn expire_old_orders(&self) -> Result<ExpiryResult, OrderManagerError> {
        let result =
            self.db.expire_old_orders(self.config.pending_order_timeout, self.config.unpaid_order_timeout).await?;
        for order in result.all_orders() {
            self.call_order_annulled_hook(order).await;
        }
        if result.total_count() > 0 {
            info!("🔄️⏲️️ Expired {} pending and {} unpaid order(s)", result.pending_count(), result.unpaid_count());
        }
        Ok(result)
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_completed_hook(&self, order: &Order) {
        for emitter in &self.producers.order_completed_producer {
            debug!("🔄️📦️ Notifying order completed hook subscribers");
            let event = OrderCompletedEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("🔄️📦️ Notifying order annulled hook subscribers");
            let event = OrderAnnulledEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
