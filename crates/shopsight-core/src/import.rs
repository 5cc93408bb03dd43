//! Bulk loading of store data from a JSON bundle
//!
//! A bundle is one JSON document with an optional array per record set,
//! shaped like the commerce platform's own export:
//!
//! ```json
//! {
//!   "daily_reports": [{"id": 1, "report_date": "2024-01-01", "total_revenue": 1000000, "total_profit": 250000}],
//!   "business_settings": {"monthly_rent_cost": 6000000},
//!   "orders": [{"id": 1001, "created_at": "2024-01-01T09:30:00Z", "line_items": [{"title": "A", "quantity": 2}]}]
//! }
//! ```
//!
//! Records are upserted by id, so loading the same bundle twice is harmless.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{
    save_business_settings_with, upsert_abandoned_checkout_with, upsert_coupon_with,
    upsert_customer_with, upsert_daily_report_with, upsert_financial_event_with,
    upsert_order_with, upsert_product_with, Database,
};
use crate::error::Result;
use crate::models::{
    AbandonedCheckout, BusinessSettings, Coupon, Customer, DailyReport, FinancialEvent, Order,
    Product,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportBundle {
    pub daily_reports: Vec<DailyReport>,
    pub business_settings: Option<BusinessSettings>,
    pub financial_events: Vec<FinancialEvent>,
    pub orders: Vec<Order>,
    pub products: Vec<Product>,
    pub coupons: Vec<Coupon>,
    pub customers: Vec<Customer>,
    pub abandoned_checkouts: Vec<AbandonedCheckout>,
}

/// Records written per table by one import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub daily_reports: usize,
    pub settings_saved: bool,
    pub financial_events: usize,
    pub orders: usize,
    pub products: usize,
    pub coupons: usize,
    pub customers: usize,
    pub abandoned_checkouts: usize,
}

impl ImportStats {
    pub fn total(&self) -> usize {
        self.daily_reports
            + usize::from(self.settings_saved)
            + self.financial_events
            + self.orders
            + self.products
            + self.coupons
            + self.customers
            + self.abandoned_checkouts
    }
}

impl ImportBundle {
    /// Read a bundle from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Database {
    /// Upsert every record in `bundle` inside a single transaction
    ///
    /// Either the whole bundle lands or nothing does.
    pub fn import_bundle(&self, bundle: &ImportBundle) -> Result<ImportStats> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut stats = ImportStats::default();

        for report in &bundle.daily_reports {
            upsert_daily_report_with(&tx, report)?;
            stats.daily_reports += 1;
        }
        if let Some(settings) = &bundle.business_settings {
            save_business_settings_with(&tx, settings)?;
            stats.settings_saved = true;
        }
        for event in &bundle.financial_events {
            upsert_financial_event_with(&tx, event)?;
            stats.financial_events += 1;
        }
        for order in &bundle.orders {
            upsert_order_with(&tx, order)?;
            stats.orders += 1;
        }
        for product in &bundle.products {
            upsert_product_with(&tx, product)?;
            stats.products += 1;
        }
        for coupon in &bundle.coupons {
            upsert_coupon_with(&tx, coupon)?;
            stats.coupons += 1;
        }
        for customer in &bundle.customers {
            upsert_customer_with(&tx, customer)?;
            stats.customers += 1;
        }
        for checkout in &bundle.abandoned_checkouts {
            upsert_abandoned_checkout_with(&tx, checkout)?;
            stats.abandoned_checkouts += 1;
        }

        tx.commit()?;
        info!("Imported {} records", stats.total());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BUNDLE: &str = r#"{
        "daily_reports": [
            {"id": 1, "report_date": "2024-01-01", "total_revenue": 1000000, "total_profit": 250000, "total_orders": 2}
        ],
        "business_settings": {"monthly_rent_cost": 6000000, "monthly_profit_target": 15000000},
        "financial_events": [
            {"id": 1, "event_name": "Tiền nhà", "amount": 6000000, "due_date": "2024-01-05"}
        ],
        "orders": [
            {"id": 1001, "created_at": "2024-01-01T09:30:00Z", "total_price": 700000,
             "line_items": [{"title": "A", "quantity": 2, "product_id": 1}],
             "discount_codes": [{"code": "TET"}, {"amount": 10000}]}
        ],
        "products": [
            {"id": 1, "title": "A", "variants": [{"inventory_quantity": 3}]}
        ],
        "coupons": [{"id": 1, "code": "TET"}],
        "customers": [{"id": 7, "first_name": "Lan", "total_spent": 2500000, "orders_count": 3}],
        "abandoned_checkouts": [{"id": 5, "created_at": "2024-01-01T10:00:00Z", "total_price": 150000}]
    }"#;

    #[test]
    fn test_import_bundle_counts() {
        let db = Database::in_memory().unwrap();
        let bundle = ImportBundle::from_json(BUNDLE).unwrap();

        let stats = db.import_bundle(&bundle).unwrap();
        assert_eq!(stats.daily_reports, 1);
        assert!(stats.settings_saved);
        assert_eq!(stats.orders, 1);
        assert_eq!(stats.total(), 8);

        let counts = db.counts().unwrap();
        assert_eq!(counts.orders, 1);
        assert_eq!(counts.customers, 1);
        assert!(counts.has_settings);
    }

    #[test]
    fn test_import_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let bundle = ImportBundle::from_json(BUNDLE).unwrap();

        db.import_bundle(&bundle).unwrap();
        db.import_bundle(&bundle).unwrap();

        let counts = db.counts().unwrap();
        assert_eq!(counts.daily_reports, 1);
        assert_eq!(counts.products, 1);
    }

    #[test]
    fn test_partial_bundle() {
        let db = Database::in_memory().unwrap();
        let bundle = ImportBundle::from_json(r#"{"coupons": [{"id": 1, "code": "VIP"}]}"#).unwrap();

        let stats = db.import_bundle(&bundle).unwrap();
        assert_eq!(stats.total(), 1);
        assert!(!stats.settings_saved);
    }

    #[test]
    fn test_resynced_report_does_not_block_bundle() {
        let db = Database::in_memory().unwrap();
        db.import_bundle(&ImportBundle::from_json(BUNDLE).unwrap())
            .unwrap();

        // Same date, new platform id, shipped with an unrelated order
        let bundle = ImportBundle::from_json(
            r#"{
                "daily_reports": [{"id": 2, "report_date": "2024-01-01", "total_revenue": 1200000, "total_profit": 300000}],
                "orders": [{"id": 1002, "created_at": "2024-01-01T12:00:00Z"}]
            }"#,
        )
        .unwrap();

        db.import_bundle(&bundle).unwrap();

        let counts = db.counts().unwrap();
        assert_eq!(counts.daily_reports, 1);
        assert_eq!(counts.orders, 2);
        let latest = db.get_latest_daily_report().unwrap().unwrap();
        assert_eq!(latest.id, 2);
        assert_eq!(latest.total_revenue, 1_200_000.0);
    }

    #[test]
    fn test_failed_import_rolls_back() {
        let db = Database::in_memory().unwrap();
        db.conn()
            .unwrap()
            .execute_batch("DROP TABLE abandoned_checkouts")
            .unwrap();

        // Coupons are written before the checkout insert fails
        let bundle = ImportBundle::from_json(
            r#"{
                "coupons": [{"id": 1, "code": "VIP"}],
                "abandoned_checkouts": [{"id": 5, "created_at": "2024-01-01T10:00:00Z"}]
            }"#,
        )
        .unwrap();

        assert!(db.import_bundle(&bundle).is_err());
        assert!(db.list_coupons().unwrap().is_empty());
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(BUNDLE.as_bytes()).unwrap();

        let bundle = ImportBundle::from_path(file.path()).unwrap();
        assert_eq!(bundle.products[0].variants[0].inventory_quantity, 3);
        assert_eq!(bundle.orders[0].discount_codes[1].code, None);
    }
}
