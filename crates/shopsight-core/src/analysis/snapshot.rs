//! Snapshot collection results and the statistics derived from them
//!
//! Everything here is recomputed from scratch for every analysis. The
//! functions are pure so they can be tested against fixed fixtures.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{
    AbandonedCheckout, BusinessSettings, Coupon, Customer, DailyReport, FinancialEvent, Order,
    Product,
};

/// Orders older than this are ignored
pub const ORDER_WINDOW_DAYS: i64 = 30;
/// Abandoned checkouts older than this are ignored
pub const ABANDONED_WINDOW_DAYS: i64 = 7;
/// Inclusive upper bound for "low stock"
pub const LOW_STOCK_THRESHOLD: i64 = 5;
/// Cap for every derived list (low stock, slow sellers, customers, events)
pub const LIST_LIMIT: usize = 5;

/// Everything read from storage for one analysis
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub report: Option<DailyReport>,
    pub settings: Option<BusinessSettings>,
    pub upcoming_events: Vec<FinancialEvent>,
    /// Orders from the last [`ORDER_WINDOW_DAYS`] days
    pub orders: Vec<Order>,
    pub products: Vec<Product>,
    pub coupons: Vec<Coupon>,
    /// Sorted by total spent, descending
    pub customers: Vec<Customer>,
    /// Checkouts from the last [`ABANDONED_WINDOW_DAYS`] days
    pub abandoned_checkouts: Vec<AbandonedCheckout>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub title: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponUsage {
    pub code: String,
    pub uses: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCustomer {
    pub name: String,
    pub total_spent: f64,
}

/// Aggregated view of a snapshot, ready for prompt rendering
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub report: DailyReport,
    /// Zeroed when no settings row exists
    pub settings: BusinessSettings,
    pub upcoming_events: Vec<FinancialEvent>,
    pub today_order_count: usize,
    /// Quantity sold per title on the report day, best sellers first
    pub top_products: Vec<ProductSales>,
    /// Discount code uses on the report day, most used first
    pub coupon_usage: Vec<CouponUsage>,
    pub low_stock: Vec<String>,
    pub slow_sellers: Vec<String>,
    pub coupon_count: usize,
    pub top_customers: Vec<TopCustomer>,
    pub abandoned_checkout_count: usize,
    pub recent_order_count: usize,
}

impl Snapshot {
    /// Derive the summary statistics
    ///
    /// Fails with `NotFound` when there is no daily report, since every
    /// financial figure in the prompt is relative to it.
    pub fn summarize(self) -> Result<SnapshotSummary> {
        let report = self
            .report
            .ok_or_else(|| Error::NotFound("No daily report available to analyze".into()))?;

        let (start, end) = day_window(report.report_date);
        let today_orders: Vec<&Order> = orders_between(&self.orders, start, end).collect();

        Ok(SnapshotSummary {
            settings: self.settings.unwrap_or_default(),
            upcoming_events: self.upcoming_events.into_iter().take(LIST_LIMIT).collect(),
            today_order_count: today_orders.len(),
            top_products: product_sales(today_orders.iter().copied()),
            coupon_usage: coupon_usage(today_orders.iter().copied()),
            low_stock: low_stock_titles(&self.products, LIST_LIMIT),
            slow_sellers: slow_seller_titles(&self.products, &self.orders, LIST_LIMIT),
            coupon_count: self.coupons.len(),
            top_customers: self
                .customers
                .iter()
                .take(LIST_LIMIT)
                .map(|c| TopCustomer {
                    name: c.full_name(),
                    total_spent: c.total_spent,
                })
                .collect(),
            abandoned_checkout_count: self.abandoned_checkouts.len(),
            recent_order_count: self.orders.len(),
            report,
        })
    }
}

/// Half-open UTC interval `[date 00:00, date+1 00:00)`
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Orders created inside `[start, end)`
pub fn orders_between<'a>(
    orders: &'a [Order],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> impl Iterator<Item = &'a Order> {
    orders
        .iter()
        .filter(move |o| o.created_at >= start && o.created_at < end)
}

/// Insertion-ordered counter; small enough that a linear scan is fine
#[derive(Default)]
struct Tally(Vec<(String, i64)>);

impl Tally {
    fn add(&mut self, key: &str, n: i64) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += n,
            None => self.0.push((key.to_string(), n)),
        }
    }

    /// Highest count first; ties keep first-seen order
    fn into_sorted(mut self) -> Vec<(String, i64)> {
        self.0.sort_by(|a, b| b.1.cmp(&a.1));
        self.0
    }
}

/// Sum line item quantities per product title
pub fn product_sales<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<ProductSales> {
    let mut tally = Tally::default();
    for item in orders.into_iter().flat_map(|o| &o.line_items) {
        tally.add(&item.title, item.quantity);
    }

    tally
        .into_sorted()
        .into_iter()
        .map(|(title, quantity)| ProductSales { title, quantity })
        .collect()
}

/// Count discount code uses, skipping entries without a code
pub fn coupon_usage<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<CouponUsage> {
    let mut tally = Tally::default();
    for discount in orders.into_iter().flat_map(|o| &o.discount_codes) {
        if let Some(code) = discount.code.as_deref().filter(|c| !c.is_empty()) {
            tally.add(code, 1);
        }
    }

    tally
        .into_sorted()
        .into_iter()
        .map(|(code, uses)| CouponUsage { code, uses })
        .collect()
}

/// Titles of products with a variant holding between 1 and
/// [`LOW_STOCK_THRESHOLD`] units, in storage order
pub fn low_stock_titles(products: &[Product], limit: usize) -> Vec<String> {
    products
        .iter()
        .filter(|p| {
            p.variants
                .iter()
                .any(|v| v.inventory_quantity > 0 && v.inventory_quantity <= LOW_STOCK_THRESHOLD)
        })
        .take(limit)
        .map(|p| p.title.clone())
        .collect()
}

/// Titles of in-stock products that appear in none of `orders`, in storage order
pub fn slow_seller_titles(products: &[Product], orders: &[Order], limit: usize) -> Vec<String> {
    let sold: HashSet<i64> = orders
        .iter()
        .flat_map(|o| &o.line_items)
        .filter_map(|item| item.product_id)
        .collect();

    products
        .iter()
        .filter(|p| !sold.contains(&p.id) && p.in_stock())
        .take(limit)
        .map(|p| p.title.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiscountCode, LineItem, Variant};
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn ts(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap()
    }

    fn item(title: &str, quantity: i64, product_id: Option<i64>) -> LineItem {
        LineItem {
            title: title.into(),
            quantity,
            product_id,
            price: None,
        }
    }

    fn order(id: i64, created_at: DateTime<Utc>, items: Vec<LineItem>, codes: &[Option<&str>]) -> Order {
        Order {
            id,
            created_at,
            total_price: 0.0,
            line_items: items,
            discount_codes: codes
                .iter()
                .map(|c| DiscountCode {
                    code: c.map(str::to_string),
                    amount: None,
                })
                .collect(),
        }
    }

    fn product(id: i64, title: &str, stock: &[i64]) -> Product {
        Product {
            id,
            title: title.into(),
            variants: stock
                .iter()
                .map(|&q| Variant {
                    id: None,
                    title: None,
                    inventory_quantity: q,
                })
                .collect(),
        }
    }

    fn report(date: NaiveDate) -> DailyReport {
        DailyReport {
            id: 1,
            report_date: date,
            total_revenue: 1_000_000.0,
            total_profit: 250_000.0,
            total_orders: 2,
        }
    }

    #[test]
    fn test_day_window_is_half_open() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let (start, end) = day_window(date);
        let orders = vec![
            order(1, ts(1, 0, 0), vec![], &[]),
            order(2, ts(1, 23, 59), vec![], &[]),
            order(3, ts(2, 0, 0), vec![], &[]),
            order(4, Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap(), vec![], &[]),
        ];

        let ids: Vec<_> = orders_between(&orders, start, end).map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_product_sales_sums_by_title() {
        let orders = vec![
            order(1, ts(1, 9, 0), vec![item("A", 2, Some(1)), item("B", 1, Some(2))], &[]),
            order(2, ts(1, 10, 0), vec![item("B", 4, Some(2))], &[]),
            order(3, ts(1, 11, 0), vec![item("C", 1, None), item("A", 1, Some(1))], &[]),
        ];

        let sales = product_sales(&orders);
        let by_title: HashMap<_, _> = sales.iter().map(|s| (s.title.as_str(), s.quantity)).collect();
        assert_eq!(by_title, HashMap::from([("A", 3), ("B", 5), ("C", 1)]));
        // Best sellers first, ties in first-seen order
        let titles: Vec<_> = sales.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_coupon_usage_skips_missing_codes() {
        let orders = vec![
            order(1, ts(1, 9, 0), vec![], &[Some("TET"), None]),
            order(2, ts(1, 10, 0), vec![], &[Some("TET"), Some("")]),
            order(3, ts(1, 11, 0), vec![], &[Some("VIP")]),
        ];

        let usage = coupon_usage(&orders);
        assert_eq!(
            usage,
            vec![
                CouponUsage {
                    code: "TET".into(),
                    uses: 2
                },
                CouponUsage {
                    code: "VIP".into(),
                    uses: 1
                },
            ]
        );
    }

    #[test]
    fn test_low_stock_bounds() {
        let products = vec![
            product(1, "Sold out", &[0, 0]),
            product(2, "Plenty", &[6, 40]),
            product(3, "Edge five", &[5]),
            product(4, "One left", &[0, 1]),
            product(5, "Negative", &[-1]),
        ];

        assert_eq!(
            low_stock_titles(&products, LIST_LIMIT),
            vec!["Edge five", "One left"]
        );
    }

    #[test]
    fn test_low_stock_capped_in_storage_order() {
        let products: Vec<_> = (1..=8)
            .map(|i| product(i, &format!("P{}", i), &[2]))
            .collect();

        assert_eq!(
            low_stock_titles(&products, LIST_LIMIT),
            vec!["P1", "P2", "P3", "P4", "P5"]
        );
    }

    #[test]
    fn test_slow_sellers_exclude_sold_and_out_of_stock() {
        let products = vec![
            product(1, "Sold", &[10]),
            product(2, "Unsold in stock", &[3]),
            product(3, "Unsold empty", &[0]),
            product(4, "Also unsold", &[0, 7]),
        ];
        let orders = vec![order(1, ts(1, 9, 0), vec![item("Sold", 1, Some(1)), item("Custom", 1, None)], &[])];

        assert_eq!(
            slow_seller_titles(&products, &orders, LIST_LIMIT),
            vec!["Unsold in stock", "Also unsold"]
        );
    }

    #[test]
    fn test_slow_sellers_capped() {
        let products: Vec<_> = (1..=9)
            .map(|i| product(i, &format!("P{}", i), &[1]))
            .collect();
        let orders = vec![order(1, ts(1, 9, 0), vec![item("P2", 1, Some(2))], &[])];

        let slow = slow_seller_titles(&products, &orders, LIST_LIMIT);
        assert_eq!(slow, vec!["P1", "P3", "P4", "P5", "P6"]);
    }

    #[test]
    fn test_summarize_without_report_is_not_found() {
        let err = Snapshot::default().summarize().unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_summarize_uses_report_day_only_for_daily_tallies() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let snapshot = Snapshot {
            report: Some(report(date)),
            orders: vec![
                order(1, ts(1, 8, 0), vec![item("A", 2, Some(1))], &[Some("NEWYEAR")]),
                order(2, ts(1, 20, 0), vec![item("B", 1, Some(2))], &[]),
                // Previous day still counts as sold for slow-seller purposes
                order(
                    3,
                    Utc.with_ymd_and_hms(2023, 12, 30, 12, 0, 0).unwrap(),
                    vec![item("C", 9, Some(3))],
                    &[Some("NEWYEAR")],
                ),
            ],
            products: vec![
                product(1, "A", &[4]),
                product(2, "B", &[20]),
                product(3, "C", &[2]),
                product(4, "D", &[8]),
            ],
            coupons: vec![Coupon {
                id: 1,
                code: "NEWYEAR".into(),
            }],
            ..Default::default()
        };

        let summary = snapshot.summarize().unwrap();
        assert_eq!(summary.today_order_count, 2);
        assert_eq!(summary.recent_order_count, 3);
        assert_eq!(
            summary.top_products,
            vec![
                ProductSales {
                    title: "A".into(),
                    quantity: 2
                },
                ProductSales {
                    title: "B".into(),
                    quantity: 1
                },
            ]
        );
        assert_eq!(summary.coupon_usage.len(), 1);
        assert_eq!(summary.coupon_usage[0].uses, 1);
        assert_eq!(summary.low_stock, vec!["A", "C"]);
        assert_eq!(summary.slow_sellers, vec!["D"]);
        assert_eq!(summary.coupon_count, 1);
        assert_eq!(summary.settings, BusinessSettings::default());
    }

    #[test]
    fn test_summarize_caps_customers_and_events() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let snapshot = Snapshot {
            report: Some(report(date)),
            customers: (1..=7)
                .map(|i| Customer {
                    id: i,
                    first_name: Some(format!("K{}", i)),
                    last_name: None,
                    total_spent: (100 - i) as f64,
                    orders_count: 1,
                })
                .collect(),
            upcoming_events: (1..=6)
                .map(|i| FinancialEvent {
                    id: i,
                    event_name: format!("E{}", i),
                    amount: 1.0,
                    due_date: date,
                    is_paid: false,
                })
                .collect(),
            ..Default::default()
        };

        let summary = snapshot.summarize().unwrap();
        assert_eq!(summary.top_customers.len(), LIST_LIMIT);
        assert_eq!(summary.top_customers[0].name, "K1");
        assert_eq!(summary.upcoming_events.len(), LIST_LIMIT);
    }
}
