//! Domain models for shopsight
//!
//! Records mirror the documents synced from the commerce platform. Nested
//! collections (order line items, discount codes, product variants) keep the
//! platform's shape so that raw exports can be loaded without reshaping.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// End-of-day financial summary produced by the reporting job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub id: i64,
    pub report_date: NaiveDate,
    pub total_revenue: f64,
    pub total_profit: f64,
    #[serde(default)]
    pub total_orders: i64,
}

/// Shop-wide cost structure and targets (singleton)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessSettings {
    #[serde(default)]
    pub monthly_rent_cost: f64,
    #[serde(default)]
    pub monthly_staff_cost: f64,
    #[serde(default)]
    pub monthly_marketing_cost: f64,
    #[serde(default)]
    pub monthly_other_cost: f64,
    #[serde(default)]
    pub monthly_profit_target: f64,
}

impl BusinessSettings {
    /// Sum of all recurring monthly costs
    pub fn monthly_fixed_cost(&self) -> f64 {
        self.monthly_rent_cost
            + self.monthly_staff_cost
            + self.monthly_marketing_cost
            + self.monthly_other_cost
    }
}

/// A scheduled payment (supplier invoice, tax, rent...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEvent {
    pub id: i64,
    pub event_name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub is_paid: bool,
}

/// A single product line inside an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub title: String,
    #[serde(default)]
    pub quantity: i64,
    /// Custom (non-catalog) lines have no product
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// A discount applied to an order
///
/// The platform occasionally sends entries without a code; those are kept
/// as-is and ignored when counting coupon usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountCode {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub discount_codes: Vec<DiscountCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub inventory_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// True if any variant has stock on hand
    pub fn in_stock(&self) -> bool {
        self.variants.iter().any(|v| v.inventory_quantity > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub orders_count: i64,
}

impl Customer {
    /// Display name in "first last" order, falling back to the customer id
    pub fn full_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if name.is_empty() {
            format!("#{}", self.id)
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbandonedCheckout {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total_price: f64,
}

/// Record counts per table, for status output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub daily_reports: i64,
    pub financial_events: i64,
    pub orders: i64,
    pub products: i64,
    pub coupons: i64,
    pub customers: i64,
    pub abandoned_checkouts: i64,
    pub has_settings: bool,
}
