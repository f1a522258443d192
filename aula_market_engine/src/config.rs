use std::env;

use am_common::parse_boolean_flag;
use chrono::Duration;
use decimal_percentage::Percentage;
use log::*;
use rust_decimal::Decimal;

const DEFAULT_TAX_RATE: f64 = 0.075;
const DEFAULT_PENDING_ORDER_TIMEOUT: Duration = Duration::hours(2);
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::hours(48);

/// Tuning knobs for the order flow. Everything here has a working default, so `EngineConfig::default()` is a usable
/// configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// The tax rate applied to order subtotals, as a fraction. 0.075 is 7.5%.
    pub tax_rate: Percentage,
    /// When true, a confirmed payment immediately runs the fulfillment flow as well.
    pub auto_fulfill: bool,
    /// The time before an order with no payment attempt is swept up by the expiry job.
    pub pending_order_timeout: Duration,
    /// The time before an order stuck in `payment_pending` is swept up by the expiry job.
    pub unpaid_order_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tax_rate: Percentage::from(DEFAULT_TAX_RATE),
            auto_fulfill: true,
            pending_order_timeout: DEFAULT_PENDING_ORDER_TIMEOUT,
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
        }
    }
}

impl EngineConfig {
    pub fn from_env_or_default() -> Self {
        let tax_rate = env::var("AM_TAX_RATE")
            .ok()
            .and_then(|s| {
                Decimal::from_str_exact(&s)
                    .map_err(|e| warn!("🪛️ {s} is not a valid tax rate for AM_TAX_RATE. {e}"))
                    .ok()
            })
            .map(Percentage::from)
            .unwrap_or_else(|| Percentage::from(DEFAULT_TAX_RATE));
        let auto_fulfill = parse_boolean_flag(env::var("AM_AUTO_FULFILL").ok(), true);
        let (pending_order_timeout, unpaid_order_timeout) = configure_order_timeouts();
        Self { tax_rate, auto_fulfill, pending_order_timeout, unpaid_order_timeout }
    }
}

fn configure_order_timeouts() -> (Duration, Duration) {
    let pending_order_timeout = env::var("AM_PENDING_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ AM_PENDING_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_PENDING_ORDER_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for AM_PENDING_ORDER_TIMEOUT. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_PENDING_ORDER_TIMEOUT);
    let unpaid_order_timeout = env::var("AM_UNPAID_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ AM_UNPAID_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_UNPAID_ORDER_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for AM_UNPAID_ORDER_TIMEOUT. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_UNPAID_ORDER_TIMEOUT);
    (pending_order_timeout, unpaid_order_timeout)
}
