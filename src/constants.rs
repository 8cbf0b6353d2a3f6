/// Labels and column layout constants shared across the pipeline
/// These match the column names and category labels of the source dataset

// Delivery status labels
pub const DELIVERED_ON_TIME: &str = "Delivered on time";
pub const DELIVERED_LATE: &str = "Delivered Late";

// Customer tier labels
pub const NORMAL_CUSTOMER: &str = "Normal Customer";
pub const FIXED_CUSTOMER: &str = "Fixed Customer";
pub const LOYAL_CUSTOMER: &str = "Loyal Customer";

// Cleaning defaults
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";
pub const DEFAULT_MISSING_COMMENT: &str = "No Comment";
pub const DEFAULT_DELIMITER: char = ';';

// Histogram bin edges for delivery duration (days)
pub const DEFAULT_DELIVERY_DAYS_BINS: [i64; 6] = [25, 50, 75, 100, 125, 225];

// Orders file: order_id, customer_id, order_status, _, order_approved_at, _,
// order_delivered_customer_date, order_estimated_delivery_date
pub const ORDERS_ORDER_ID: usize = 0;
pub const ORDERS_CUSTOMER_ID: usize = 1;
pub const ORDERS_STATUS: usize = 2;
pub const ORDERS_APPROVED_AT: usize = 4;
pub const ORDERS_DELIVERED_AT: usize = 6;
pub const ORDERS_ESTIMATED_DELIVERY_AT: usize = 7;

// Items file: order_id, order_item_id, product_id, _, _, price, freight_value
pub const ITEMS_ORDER_ID: usize = 0;
pub const ITEMS_ITEM_SEQUENCE: usize = 1;
pub const ITEMS_PRODUCT_ID: usize = 2;
pub const ITEMS_PRICE: usize = 5;
pub const ITEMS_FREIGHT_VALUE: usize = 6;

// Payments file
pub const PAYMENTS_ORDER_ID: &str = "order_id";
pub const PAYMENTS_SEQUENCE: &str = "payment_sequential";
pub const PAYMENTS_TYPE: &str = "payment_type";
pub const PAYMENTS_INSTALLMENTS: &str = "payment_installments";
pub const PAYMENTS_VALUE: &str = "payment_value";

// Reviews file
pub const REVIEWS_REVIEW_ID: &str = "review_id";
pub const REVIEWS_ORDER_ID: &str = "order_id";
pub const REVIEWS_SCORE: &str = "review_score";
pub const REVIEWS_COMMENT: &str = "review_comment_message";
