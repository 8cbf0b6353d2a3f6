use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info};

use crate::constants::{self, DEFAULT_MISSING_COMMENT};
use crate::domain::{Order, OrderItem, Payment, Review, ReviewScore};
use crate::error::Result;
use crate::pipeline::processing::normalize::{
    clean_text, parse_count, parse_decimal, parse_integer, parse_score, FieldNormalizer,
};
use crate::types::{cell, ColumnRef, RawTable, TableKind};

/// Why a row was refused admission to its record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Order id or review id absent
    MissingIdentity,
    /// A required timestamp cell is empty
    MissingTimestamp,
    /// A required timestamp does not match the expected format
    InvalidTimestamp,
    /// No digit in 1..=5 could be extracted from the review score
    InvalidScore,
    /// Exact duplicate of an earlier row
    DuplicateRow,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingIdentity => "missing_identity",
            RejectReason::MissingTimestamp => "missing_timestamp",
            RejectReason::InvalidTimestamp => "invalid_timestamp",
            RejectReason::InvalidScore => "invalid_score",
            RejectReason::DuplicateRow => "duplicate_row",
        }
    }
}

/// Audit trail of one cleaning pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub table: TableKind,
    pub input_rows: usize,
    pub accepted_rows: usize,
    pub rejections: BTreeMap<RejectReason, usize>,
}

impl CleaningReport {
    pub fn new(table: TableKind, input_rows: usize) -> Self {
        Self {
            table,
            input_rows,
            accepted_rows: 0,
            rejections: BTreeMap::new(),
        }
    }

    fn reject(&mut self, row: usize, reason: RejectReason) {
        debug!(table = %self.table, row, reason = reason.as_str(), "Row rejected");
        *self.rejections.entry(reason).or_insert(0) += 1;
    }

    pub fn rejected_rows(&self) -> usize {
        self.rejections.values().sum()
    }

    pub fn rejected(&self, reason: RejectReason) -> usize {
        self.rejections.get(&reason).copied().unwrap_or(0)
    }

    /// Share of input rows that were dropped, as a percentage
    pub fn rejection_rate(&self) -> f64 {
        if self.input_rows == 0 {
            return 0.0;
        }
        self.rejected_rows() as f64 / self.input_rows as f64 * 100.0
    }
}

/// A validated record set plus the report of what was dropped on the way
#[derive(Debug, Clone)]
pub struct CleanedSet<T> {
    pub records: Vec<T>,
    pub report: CleaningReport,
}

impl<T> CleanedSet<T> {
    fn finish(records: Vec<T>, mut report: CleaningReport) -> Self {
        report.accepted_rows = records.len();
        info!(
            table = %report.table,
            input = report.input_rows,
            accepted = report.accepted_rows,
            rejected = report.rejected_rows(),
            rejected_pct = report.rejection_rate(),
            "Cleaned record set"
        );
        Self { records, report }
    }
}

/// Turns one raw input table into a validated record set
pub trait Cleaner {
    type Record;

    fn table(&self) -> TableKind;

    /// Project, validate and admit rows. Only structural problems (a projected
    /// column that does not exist) are errors; bad rows are dropped and tallied.
    fn clean(&self, table: &RawTable) -> Result<CleanedSet<Self::Record>>;
}

/// Orders: all three timestamps are required
#[derive(Debug, Clone, Default)]
pub struct OrderCleaner {
    pub normalizer: FieldNormalizer,
}

impl OrderCleaner {
    pub fn new(normalizer: FieldNormalizer) -> Self {
        Self { normalizer }
    }

    fn required_timestamp(
        &self,
        raw: Option<&str>,
    ) -> std::result::Result<NaiveDateTime, RejectReason> {
        match raw {
            None => Err(RejectReason::MissingTimestamp),
            Some(value) => self
                .normalizer
                .timestamp(Some(value))
                .ok_or(RejectReason::InvalidTimestamp),
        }
    }

    fn admit(
        &self,
        row: &[Option<String>],
        columns: &[usize; 6],
    ) -> std::result::Result<Order, RejectReason> {
        let [id, customer, status, approved, delivered, estimated] = *columns;
        let order_id = clean_text(cell(row, id)).ok_or(RejectReason::MissingIdentity)?;
        let approved_at = self.required_timestamp(cell(row, approved))?;
        let delivered_at = self.required_timestamp(cell(row, delivered))?;
        let estimated_delivery_at = self.required_timestamp(cell(row, estimated))?;

        Ok(Order {
            order_id,
            customer_id: clean_text(cell(row, customer)),
            order_status: clean_text(cell(row, status)),
            approved_at,
            delivered_at,
            estimated_delivery_at,
        })
    }
}

impl Cleaner for OrderCleaner {
    type Record = Order;

    fn table(&self) -> TableKind {
        TableKind::Orders
    }

    fn clean(&self, table: &RawTable) -> Result<CleanedSet<Order>> {
        let columns = [
            table.resolve(ColumnRef::Position(constants::ORDERS_ORDER_ID, "order_id"))?,
            table.resolve(ColumnRef::Position(constants::ORDERS_CUSTOMER_ID, "customer_id"))?,
            table.resolve(ColumnRef::Position(constants::ORDERS_STATUS, "order_status"))?,
            table.resolve(ColumnRef::Position(constants::ORDERS_APPROVED_AT, "order_approved_at"))?,
            table.resolve(ColumnRef::Position(
                constants::ORDERS_DELIVERED_AT,
                "order_delivered_customer_date",
            ))?,
            table.resolve(ColumnRef::Position(
                constants::ORDERS_ESTIMATED_DELIVERY_AT,
                "order_estimated_delivery_date",
            ))?,
        ];

        let mut report = CleaningReport::new(TableKind::Orders, table.len());
        let mut records = Vec::with_capacity(table.len());

        for (index, row) in table.rows.iter().enumerate() {
            match self.admit(row, &columns) {
                Ok(order) => records.push(order),
                Err(reason) => report.reject(index, reason),
            }
        }

        Ok(CleanedSet::finish(records, report))
    }
}

/// Reviews: lenient score extraction, exact dedup, identity check, comment fill
#[derive(Debug, Clone)]
pub struct ReviewCleaner {
    pub missing_comment: String,
}

impl Default for ReviewCleaner {
    fn default() -> Self {
        Self {
            missing_comment: DEFAULT_MISSING_COMMENT.to_string(),
        }
    }
}

impl ReviewCleaner {
    pub fn new(missing_comment: &str) -> Self {
        Self {
            missing_comment: missing_comment.to_string(),
        }
    }
}

// Row shape compared for exact duplicates once the score has been extracted
type ReviewKey<'a> = (Option<&'a str>, Option<&'a str>, ReviewScore, Option<&'a str>);

impl Cleaner for ReviewCleaner {
    type Record = Review;

    fn table(&self) -> TableKind {
        TableKind::Reviews
    }

    fn clean(&self, table: &RawTable) -> Result<CleanedSet<Review>> {
        let review_id = table.resolve(ColumnRef::Name(constants::REVIEWS_REVIEW_ID))?;
        let order_id = table.resolve(ColumnRef::Name(constants::REVIEWS_ORDER_ID))?;
        let score = table.resolve(ColumnRef::Name(constants::REVIEWS_SCORE))?;
        let comment = table.resolve(ColumnRef::Name(constants::REVIEWS_COMMENT))?;

        let mut report = CleaningReport::new(TableKind::Reviews, table.len());
        let mut seen: HashSet<ReviewKey<'_>> = HashSet::new();
        let mut records = Vec::new();

        for (index, row) in table.rows.iter().enumerate() {
            let Some(parsed_score) = cell(row, score).and_then(parse_score) else {
                report.reject(index, RejectReason::InvalidScore);
                continue;
            };

            let key = (
                cell(row, review_id),
                cell(row, order_id),
                parsed_score,
                cell(row, comment),
            );
            if !seen.insert(key) {
                report.reject(index, RejectReason::DuplicateRow);
                continue;
            }

            let (Some(review_id), Some(order_id)) = (
                clean_text(cell(row, review_id)),
                clean_text(cell(row, order_id)),
            ) else {
                report.reject(index, RejectReason::MissingIdentity);
                continue;
            };

            records.push(Review {
                review_id,
                order_id,
                score: parsed_score,
                comment: clean_text(cell(row, comment))
                    .unwrap_or_else(|| self.missing_comment.clone()),
            });
        }

        Ok(CleanedSet::finish(records, report))
    }
}

/// Payments: projection only. An unreadable sequence becomes `None` rather
/// than a rejection; rows without an order id cannot join and are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentCleaner;

impl Cleaner for PaymentCleaner {
    type Record = Payment;

    fn table(&self) -> TableKind {
        TableKind::Payments
    }

    fn clean(&self, table: &RawTable) -> Result<CleanedSet<Payment>> {
        let order_id = table.resolve(ColumnRef::Name(constants::PAYMENTS_ORDER_ID))?;
        let sequence = table.resolve(ColumnRef::Name(constants::PAYMENTS_SEQUENCE))?;
        let payment_type = table.resolve(ColumnRef::Name(constants::PAYMENTS_TYPE))?;
        // Carried through when present; older exports omit them
        let installments = table
            .resolve(ColumnRef::Name(constants::PAYMENTS_INSTALLMENTS))
            .ok();
        let value = table.resolve(ColumnRef::Name(constants::PAYMENTS_VALUE)).ok();

        let mut report = CleaningReport::new(TableKind::Payments, table.len());
        let mut records = Vec::with_capacity(table.len());

        for (index, row) in table.rows.iter().enumerate() {
            let Some(id) = clean_text(cell(row, order_id)) else {
                report.reject(index, RejectReason::MissingIdentity);
                continue;
            };
            let seq = cell(row, sequence).and_then(parse_integer);
            if seq.is_none() {
                debug!(row = index, "Payment sequence unreadable, kept as null");
            }

            records.push(Payment {
                order_id: id,
                sequence: seq,
                payment_type: clean_text(cell(row, payment_type)),
                installments: installments.and_then(|i| cell(row, i)).and_then(parse_count),
                value: value.and_then(|i| cell(row, i)).and_then(parse_decimal),
            });
        }

        Ok(CleanedSet::finish(records, report))
    }
}

/// Items: projection only; rows without an order id cannot join and are dropped
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemCleaner;

impl Cleaner for ItemCleaner {
    type Record = OrderItem;

    fn table(&self) -> TableKind {
        TableKind::Items
    }

    fn clean(&self, table: &RawTable) -> Result<CleanedSet<OrderItem>> {
        let order_id = table.resolve(ColumnRef::Position(constants::ITEMS_ORDER_ID, "order_id"))?;
        let item_sequence =
            table.resolve(ColumnRef::Position(constants::ITEMS_ITEM_SEQUENCE, "order_item_id"))?;
        let product_id =
            table.resolve(ColumnRef::Position(constants::ITEMS_PRODUCT_ID, "product_id"))?;
        let price = table.resolve(ColumnRef::Position(constants::ITEMS_PRICE, "price"))?;
        let freight_value =
            table.resolve(ColumnRef::Position(constants::ITEMS_FREIGHT_VALUE, "freight_value"))?;

        let mut report = CleaningReport::new(TableKind::Items, table.len());
        let mut records = Vec::with_capacity(table.len());

        for (index, row) in table.rows.iter().enumerate() {
            let Some(id) = clean_text(cell(row, order_id)) else {
                report.reject(index, RejectReason::MissingIdentity);
                continue;
            };

            records.push(OrderItem {
                order_id: id,
                item_sequence: cell(row, item_sequence).and_then(parse_count),
                product_id: clean_text(cell(row, product_id)),
                price: cell(row, price).and_then(parse_decimal),
                freight_value: cell(row, freight_value).and_then(parse_decimal),
            });
        }

        Ok(CleanedSet::finish(records, report))
    }
}
