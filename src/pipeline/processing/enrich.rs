use chrono::NaiveDateTime;
use tracing::info;

use crate::domain::{CustomerTier, DeliveredOrder, DeliveryStatus, Order, Payment, TieredPayment};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Classify delivery timeliness. Delivery exactly at the estimate is on time.
pub fn delivery_status(delivered_at: NaiveDateTime, estimated_at: NaiveDateTime) -> DeliveryStatus {
    if delivered_at <= estimated_at {
        DeliveryStatus::OnTime
    } else {
        DeliveryStatus::Late
    }
}

/// Days from approval to delivery, rounded to the nearest whole day
/// (halves round away from zero). The sign is passed through.
pub fn delivery_days(approved_at: NaiveDateTime, delivered_at: NaiveDateTime) -> i64 {
    let seconds = (delivered_at - approved_at).num_seconds() as f64;
    (seconds / SECONDS_PER_DAY).round() as i64
}

/// Loyalty tier from the payment sequence. Only 1 is Normal and 2..=5 is
/// Fixed; everything else, 0 and negatives included, is Loyal.
pub fn customer_tier(sequence: i64) -> CustomerTier {
    match sequence {
        1 => CustomerTier::Normal,
        2..=5 => CustomerTier::Fixed,
        _ => CustomerTier::Loyal,
    }
}

/// Derives per-record business metrics from cleaned record sets
pub trait Enricher {
    fn enrich_orders(&self, orders: Vec<Order>) -> Vec<DeliveredOrder>;

    fn enrich_payments(&self, payments: Vec<Payment>) -> Vec<TieredPayment>;
}

/// Delivery status, duration and customer tier as used by the dashboard
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEnricher;

impl DefaultEnricher {
    pub fn new() -> Self {
        Self
    }
}

impl Enricher for DefaultEnricher {
    fn enrich_orders(&self, orders: Vec<Order>) -> Vec<DeliveredOrder> {
        let enriched: Vec<DeliveredOrder> = orders
            .into_iter()
            .map(|order| DeliveredOrder {
                delivery_status: delivery_status(order.delivered_at, order.estimated_delivery_at),
                delivery_days: delivery_days(order.approved_at, order.delivered_at),
                order,
            })
            .collect();

        let late = enriched
            .iter()
            .filter(|o| o.delivery_status == DeliveryStatus::Late)
            .count();
        info!(orders = enriched.len(), late, "Derived delivery metrics");
        enriched
    }

    fn enrich_payments(&self, payments: Vec<Payment>) -> Vec<TieredPayment> {
        let enriched: Vec<TieredPayment> = payments
            .into_iter()
            .map(|payment| TieredPayment {
                customer_tier: payment.sequence.map(customer_tier),
                payment,
            })
            .collect();

        info!(payments = enriched.len(), "Derived customer tiers");
        enriched
    }
}
