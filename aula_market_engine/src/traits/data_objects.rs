use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// The outcome of a bulk expiry sweep, split by the status the orders were in when they went
/// stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryResult {
    pub pending: Vec<Order>,
    pub unpaid: Vec<Order>,
}

impl ExpiryResult {
    pub fn new(pending: Vec<Order>, unpaid: Vec<Order>) -> Self {
        Self { pending, unpaid }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn unpaid_count(&self) -> usize {
        self.unpaid.len()
    }

    pub fn total_count(&self) -> usize {
        self.pending_count() + self.unpaid_count()
    }

    /// All expired orders, pending first.
    pub fn all_orders(&self) -> impl Iterator<Item = &Order> {
        self.pending.iter().chain(self.unpaid.iter())
    }
}
