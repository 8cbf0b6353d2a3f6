use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DELIVERED_LATE, DELIVERED_ON_TIME, FIXED_CUSTOMER, LOYAL_CUSTOMER, NORMAL_CUSTOMER,
};

/// A cleaned order with all three timestamps present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: Option<String>,
    pub order_status: Option<String>,
    pub approved_at: NaiveDateTime,
    pub delivered_at: NaiveDateTime,
    pub estimated_delivery_at: NaiveDateTime,
}

/// A cleaned payment row. Many payments may exist per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub order_id: String,
    /// `None` when the cell is empty or not a whole number; such rows are
    /// kept by cleaning and fall out at the items/payments join
    pub sequence: Option<i64>,
    pub payment_type: Option<String>,
    pub installments: Option<u32>,
    pub value: Option<f64>,
}

/// A cleaned order line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    pub item_sequence: Option<u32>,
    pub product_id: Option<String>,
    pub price: Option<f64>,
    pub freight_value: Option<f64>,
}

/// A cleaned review; the comment is filled with a sentinel when missing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub order_id: String,
    pub score: ReviewScore,
    pub comment: String,
}

/// Review score restricted to 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ReviewScore(u8);

impl ReviewScore {
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ReviewScore {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("review score {} outside 1..=5", value))
    }
}

impl From<ReviewScore> for u8 {
    fn from(score: ReviewScore) -> Self {
        score.0
    }
}

/// Delivery timeliness relative to the estimated delivery date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "Delivered on time")]
    OnTime,
    #[serde(rename = "Delivered Late")]
    Late,
}

impl DeliveryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStatus::OnTime => DELIVERED_ON_TIME,
            DeliveryStatus::Late => DELIVERED_LATE,
        }
    }

    /// Parse a status label. Anything other than the two known labels is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            DELIVERED_ON_TIME => Some(DeliveryStatus::OnTime),
            DELIVERED_LATE => Some(DeliveryStatus::Late),
            _ => None,
        }
    }

    /// Numeric proxy used for correlation against review scores
    pub fn encoded(&self) -> u8 {
        match self {
            DeliveryStatus::OnTime => 0,
            DeliveryStatus::Late => 1,
        }
    }
}

/// Loyalty classification derived from the payment sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerTier {
    #[serde(rename = "Normal Customer")]
    Normal,
    #[serde(rename = "Fixed Customer")]
    Fixed,
    #[serde(rename = "Loyal Customer")]
    Loyal,
}

impl CustomerTier {
    pub fn label(&self) -> &'static str {
        match self {
            CustomerTier::Normal => NORMAL_CUSTOMER,
            CustomerTier::Fixed => FIXED_CUSTOMER,
            CustomerTier::Loyal => LOYAL_CUSTOMER,
        }
    }
}

/// An order with its derived delivery metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveredOrder {
    #[serde(flatten)]
    pub order: Order,
    pub delivery_status: DeliveryStatus,
    /// Whole days between approval and delivery; negative when the data is inconsistent
    pub delivery_days: i64,
}

/// A payment with its derived customer tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredPayment {
    #[serde(flatten)]
    pub payment: Payment,
    /// Absent exactly when the sequence is absent
    pub customer_tier: Option<CustomerTier>,
}

/// First join stage output: an order that has a review
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReview {
    pub order: DeliveredOrder,
    pub review: Review,
}

/// Second join stage output: an item that has a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPayment {
    pub item: OrderItem,
    pub payment: TieredPayment,
}

/// One row of the analytical view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticalRow {
    pub order: DeliveredOrder,
    pub review: Review,
    /// Item and payment for the order; `None` when the order has no paid item
    pub line: Option<ItemPayment>,
    /// 0 = delivered on time, 1 = delivered late
    pub status_flag: u8,
}

impl AnalyticalRow {
    pub fn order_id(&self) -> &str {
        &self.order.order.order_id
    }

    pub fn delivered_at(&self) -> NaiveDateTime {
        self.order.order.delivered_at
    }

    pub fn delivery_status(&self) -> DeliveryStatus {
        self.order.delivery_status
    }

    pub fn review_score(&self) -> ReviewScore {
        self.review.score
    }

    pub fn payment_type(&self) -> Option<&str> {
        self.line
            .as_ref()
            .and_then(|line| line.payment.payment.payment_type.as_deref())
    }

    pub fn payment_sequence(&self) -> Option<i64> {
        self.line.as_ref().and_then(|line| line.payment.payment.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_score_bounds() {
        assert!(ReviewScore::new(0).is_none());
        assert!(ReviewScore::new(6).is_none());
        assert_eq!(ReviewScore::new(5).map(|s| s.value()), Some(5));
    }

    #[test]
    fn test_status_labels_round_trip() {
        for status in [DeliveryStatus::OnTime, DeliveryStatus::Late] {
            assert_eq!(DeliveryStatus::from_label(status.label()), Some(status));
        }
        assert_eq!(DeliveryStatus::from_label("Shipped"), None);
        assert_eq!(DeliveryStatus::OnTime.encoded(), 0);
        assert_eq!(DeliveryStatus::Late.encoded(), 1);
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&DeliveryStatus::Late).unwrap();
        assert_eq!(json, "\"Delivered Late\"");
        let json = serde_json::to_string(&CustomerTier::Fixed).unwrap();
        assert_eq!(json, "\"Fixed Customer\"");
    }
}
