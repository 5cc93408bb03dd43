//! Read-only access to the record sets an analysis needs
//!
//! `SnapshotSource` is the seam between the analyzer and persistence. The
//! SQLite implementation runs every query on the blocking thread pool so that
//! the analyzer can issue all reads at once and join them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    AbandonedCheckout, BusinessSettings, Coupon, Customer, DailyReport, FinancialEvent, Order,
    Product,
};

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Most recent daily report by report date
    async fn latest_daily_report(&self) -> Result<Option<DailyReport>>;

    async fn business_settings(&self) -> Result<Option<BusinessSettings>>;

    /// Unpaid events due on or after `today`, soonest first
    async fn upcoming_unpaid_events(&self, today: NaiveDate) -> Result<Vec<FinancialEvent>>;

    async fn orders_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>>;

    /// All products in storage order
    async fn products(&self) -> Result<Vec<Product>>;

    async fn coupons(&self) -> Result<Vec<Coupon>>;

    /// All customers, biggest spenders first
    async fn customers_by_spend(&self) -> Result<Vec<Customer>>;

    async fn abandoned_checkouts_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AbandonedCheckout>>;
}

impl Database {
    /// Run a blocking query against a cloned handle on the blocking pool
    async fn blocking<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || query(&db)).await?
    }
}

#[async_trait]
impl SnapshotSource for Database {
    async fn latest_daily_report(&self) -> Result<Option<DailyReport>> {
        self.blocking(|db| db.get_latest_daily_report()).await
    }

    async fn business_settings(&self) -> Result<Option<BusinessSettings>> {
        self.blocking(|db| db.get_business_settings()).await
    }

    async fn upcoming_unpaid_events(&self, today: NaiveDate) -> Result<Vec<FinancialEvent>> {
        self.blocking(move |db| db.list_upcoming_unpaid_events(today))
            .await
    }

    async fn orders_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>> {
        self.blocking(move |db| db.list_orders_since(since)).await
    }

    async fn products(&self) -> Result<Vec<Product>> {
        self.blocking(|db| db.list_products()).await
    }

    async fn coupons(&self) -> Result<Vec<Coupon>> {
        self.blocking(|db| db.list_coupons()).await
    }

    async fn customers_by_spend(&self) -> Result<Vec<Customer>> {
        self.blocking(|db| db.list_customers_by_spend()).await
    }

    async fn abandoned_checkouts_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AbandonedCheckout>> {
        self.blocking(move |db| db.list_abandoned_checkouts_since(since))
            .await
    }
}
