//! Joins the cleaned record sets into the analytical view.
//!
//! Three left joins on order id run in a fixed order:
//! 1. orders ⟕ reviews, rows without a review are eliminated
//! 2. items ⟕ payments, rows without a payment or without a payment
//!    sequence are eliminated
//! 3. (1) ⟕ (2), unmatched orders are kept with no line
//!
//! Fan-out is kept on both sides, so the view usually has more rows than
//! there are orders.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{
    AnalyticalRow, DeliveredOrder, ItemPayment, OrderItem, OrderReview, Review, TieredPayment,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStage {
    OrdersReviews,
    ItemsPayments,
    OrdersLines,
}

impl JoinStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStage::OrdersReviews => "orders_reviews",
            JoinStage::ItemsPayments => "items_payments",
            JoinStage::OrdersLines => "orders_lines",
        }
    }
}

/// Row accounting for a single join stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinStageReport {
    pub stage: JoinStage,
    pub left_rows: usize,
    pub right_rows: usize,
    /// Left rows that found no counterpart
    pub unmatched_left: usize,
    /// Rows removed by the stage's null elimination
    pub eliminated: usize,
    pub output_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinReport {
    pub stages: Vec<JoinStageReport>,
}

impl JoinReport {
    pub fn stage(&self, stage: JoinStage) -> Option<&JoinStageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

/// The fully joined, denormalized dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticalView {
    rows: Vec<AnalyticalRow>,
}

impl AnalyticalView {
    pub fn new(rows: Vec<AnalyticalRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[AnalyticalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest delivery date in the view; `None` when it is empty
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.rows.iter().map(|row| row.delivered_at().date());
        let min = dates.clone().min()?;
        let max = dates.max()?;
        Some((min, max))
    }
}

/// Left join on a string key. Every left record appears at least once, in
/// input order; matches follow right-side input order.
pub fn left_join<'a, L, R, KL, KR>(
    left: &'a [L],
    right: &'a [R],
    left_key: KL,
    right_key: KR,
) -> Vec<(&'a L, Option<&'a R>)>
where
    KL: Fn(&'a L) -> &'a str,
    KR: Fn(&'a R) -> &'a str,
{
    let mut index: HashMap<&'a str, Vec<&'a R>> = HashMap::new();
    for record in right {
        index.entry(right_key(record)).or_default().push(record);
    }

    let mut joined = Vec::with_capacity(left.len());
    for record in left {
        match index.get(left_key(record)) {
            Some(matches) => joined.extend(matches.iter().map(|m| (record, Some(*m)))),
            None => joined.push((record, None)),
        }
    }
    joined
}

fn stage_report<L, R>(
    stage: JoinStage,
    left_rows: usize,
    right_rows: usize,
    joined: &[(L, Option<R>)],
    eliminates: impl Fn(&Option<R>) -> bool,
) -> JoinStageReport {
    let unmatched_left = joined.iter().filter(|(_, r)| r.is_none()).count();
    let eliminated = joined.iter().filter(|(_, r)| eliminates(r)).count();
    JoinStageReport {
        stage,
        left_rows,
        right_rows,
        unmatched_left,
        eliminated,
        output_rows: joined.len() - eliminated,
    }
}

/// Runs the three join stages over cleaned and enriched record sets
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinOrchestrator;

impl JoinOrchestrator {
    pub fn new() -> Self {
        Self
    }

    pub fn join(
        &self,
        orders: &[DeliveredOrder],
        reviews: &[Review],
        items: &[OrderItem],
        payments: &[TieredPayment],
    ) -> (AnalyticalView, JoinReport) {
        let mut report = JoinReport::default();

        let joined = left_join(orders, reviews, |o| o.order.order_id.as_str(), |r| r.order_id.as_str());
        report.stages.push(stage_report(
            JoinStage::OrdersReviews,
            orders.len(),
            reviews.len(),
            &joined,
            |review| review.is_none(),
        ));
        let order_reviews: Vec<OrderReview> = joined
            .into_iter()
            .filter_map(|(order, review)| {
                review.map(|review| OrderReview {
                    order: order.clone(),
                    review: review.clone(),
                })
            })
            .collect();

        let joined = left_join(items, payments, |i| i.order_id.as_str(), |p| p.payment.order_id.as_str());
        report.stages.push(stage_report(
            JoinStage::ItemsPayments,
            items.len(),
            payments.len(),
            &joined,
            |payment| payment.map_or(true, |p| p.payment.sequence.is_none()),
        ));
        let item_payments: Vec<ItemPayment> = joined
            .into_iter()
            .filter_map(|(item, payment)| {
                payment.filter(|p| p.payment.sequence.is_some()).map(|payment| ItemPayment {
                    item: item.clone(),
                    payment: payment.clone(),
                })
            })
            .collect();

        let joined = left_join(
            &order_reviews,
            &item_payments,
            |or| or.order.order.order_id.as_str(),
            |ip| ip.item.order_id.as_str(),
        );
        report.stages.push(stage_report(
            JoinStage::OrdersLines,
            order_reviews.len(),
            item_payments.len(),
            &joined,
            |_| false,
        ));
        let rows: Vec<AnalyticalRow> = joined
            .into_iter()
            .map(|(left, line)| AnalyticalRow {
                order: left.order.clone(),
                review: left.review.clone(),
                line: line.cloned(),
                status_flag: left.order.delivery_status.encoded(),
            })
            .collect();

        for stage in &report.stages {
            info!(
                stage = stage.stage.as_str(),
                left = stage.left_rows,
                right = stage.right_rows,
                unmatched = stage.unmatched_left,
                eliminated = stage.eliminated,
                output = stage.output_rows,
                "Join stage complete"
            );
        }
        if rows.is_empty() {
            warn!("Analytical view is empty: no orders overlap with reviews");
        }

        (AnalyticalView::new(rows), report)
    }
}
