//! AI business analysis of the latest store snapshot
//!
//! One analysis run:
//! 1. reads the eight record sets concurrently from a [`SnapshotSource`]
//! 2. aggregates them into a [`SnapshotSummary`]
//! 3. renders the prompt with [`PromptBuilder`]
//! 4. sends it to an [`AIBackend`] and parses the JSON reply
//!
//! Nothing is cached or written; every call starts from fresh reads.

mod parsing;
mod prompt;
mod snapshot;
mod types;

pub use parsing::{parse_analysis_response, strip_code_fences};
pub use prompt::{format_date, format_vnd, PromptBuilder};
pub use snapshot::{
    coupon_usage, day_window, low_stock_titles, orders_between, product_sales,
    slow_seller_titles, CouponUsage, ProductSales, Snapshot, SnapshotSummary, TopCustomer,
    ABANDONED_WINDOW_DAYS, LIST_LIMIT, LOW_STOCK_THRESHOLD, ORDER_WINDOW_DAYS,
};
pub use types::{ActionItem, AnalysisAlert, AnalysisResult};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::ai::AIBackend;
use crate::error::Result;
use crate::source::SnapshotSource;

/// Analyzer over an injected data source and AI backend
pub struct BusinessSnapshotAnalyzer<S, A> {
    source: S,
    ai: A,
}

impl<S: SnapshotSource, A: AIBackend> BusinessSnapshotAnalyzer<S, A> {
    pub fn new(source: S, ai: A) -> Self {
        Self { source, ai }
    }

    /// Run an analysis as of the current time
    pub async fn analyze(&self) -> Result<AnalysisResult> {
        self.analyze_at(Utc::now()).await
    }

    /// Run an analysis with windows anchored at `now`
    pub async fn analyze_at(&self, now: DateTime<Utc>) -> Result<AnalysisResult> {
        let prompt = self.build_prompt_at(now).await?;

        info!(
            "Requesting analysis from {} ({})",
            self.ai.model(),
            self.ai.host()
        );
        let raw = self.ai.generate(&prompt).await?;
        debug!("AI reply ({} chars): {}", raw.len(), raw);

        let result = parse_analysis_response(&raw)?;
        info!(
            "Analysis complete: {} alerts, {} insights, {} actions",
            result.alerts.len(),
            result.insights.len(),
            result.action_plan.len()
        );
        Ok(result)
    }

    /// Collect, aggregate and render, without calling the AI backend
    ///
    /// Fails with `NotFound` when there is no daily report.
    pub async fn build_prompt_at(&self, now: DateTime<Utc>) -> Result<String> {
        let snapshot = self.collect_snapshot(now).await?;
        if snapshot.settings.is_none() {
            warn!("No business settings stored, using zero costs and targets");
        }

        let summary = snapshot.summarize()?;
        let prompt = PromptBuilder::new(&summary).build()?;
        debug!("Built analysis prompt ({} chars)", prompt.len());
        Ok(prompt)
    }

    /// Issue all eight reads at once; the first failure aborts the rest
    pub async fn collect_snapshot(&self, now: DateTime<Utc>) -> Result<Snapshot> {
        let today = now.date_naive();
        let orders_since = now - Duration::days(ORDER_WINDOW_DAYS);
        let abandoned_since = now - Duration::days(ABANDONED_WINDOW_DAYS);

        let (report, settings, upcoming_events, orders, products, coupons, customers, abandoned) =
            tokio::try_join!(
                self.source.latest_daily_report(),
                self.source.business_settings(),
                self.source.upcoming_unpaid_events(today),
                self.source.orders_since(orders_since),
                self.source.products(),
                self.source.coupons(),
                self.source.customers_by_spend(),
                self.source.abandoned_checkouts_since(abandoned_since),
            )?;

        info!(
            "Collected snapshot: {} orders, {} products, {} customers, {} abandoned checkouts",
            orders.len(),
            products.len(),
            customers.len(),
            abandoned.len()
        );

        Ok(Snapshot {
            report,
            settings,
            upcoming_events,
            orders,
            products,
            coupons,
            customers,
            abandoned_checkouts: abandoned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::error::{Error, ErrorKind};
    use crate::models::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};

    /// In-memory source with an optional failure on the product read
    #[derive(Default)]
    struct FixtureSource {
        report: Option<DailyReport>,
        orders: Vec<Order>,
        products: Vec<Product>,
        fail_products: bool,
    }

    #[async_trait]
    impl SnapshotSource for FixtureSource {
        async fn latest_daily_report(&self) -> Result<Option<DailyReport>> {
            Ok(self.report.clone())
        }
        async fn business_settings(&self) -> Result<Option<BusinessSettings>> {
            Ok(None)
        }
        async fn upcoming_unpaid_events(&self, _today: NaiveDate) -> Result<Vec<FinancialEvent>> {
            Ok(vec![])
        }
        async fn orders_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>> {
            Ok(self
                .orders
                .iter()
                .filter(|o| o.created_at >= since)
                .cloned()
                .collect())
        }
        async fn products(&self) -> Result<Vec<Product>> {
            if self.fail_products {
                return Err(Error::Upstream("products unavailable".into()));
            }
            Ok(self.products.clone())
        }
        async fn coupons(&self) -> Result<Vec<Coupon>> {
            Ok(vec![])
        }
        async fn customers_by_spend(&self) -> Result<Vec<Customer>> {
            Ok(vec![])
        }
        async fn abandoned_checkouts_since(
            &self,
            _since: DateTime<Utc>,
        ) -> Result<Vec<AbandonedCheckout>> {
            Ok(vec![])
        }
    }

    const REPLY: &str = "```json\n{\"alerts\":[],\"insights\":[\"x\",\"y\",\"z\"],\"action_plan\":[{\"action\":\"a\",\"details\":\"b\"},{\"action\":\"c\",\"details\":\"d\"},{\"action\":\"e\",\"details\":\"f\"}]}\n```";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
    }

    fn fixture() -> FixtureSource {
        FixtureSource {
            report: Some(DailyReport {
                id: 1,
                report_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                total_revenue: 1_000_000.0,
                total_profit: 200_000.0,
                total_orders: 1,
            }),
            orders: vec![
                Order {
                    id: 10,
                    created_at: Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap(),
                    total_price: 1_000_000.0,
                    line_items: vec![LineItem {
                        title: "A".into(),
                        quantity: 2,
                        product_id: Some(1),
                        price: None,
                    }],
                    discount_codes: vec![],
                },
                // Outside the 30-day window
                Order {
                    id: 11,
                    created_at: Utc.with_ymd_and_hms(2023, 11, 1, 14, 0, 0).unwrap(),
                    total_price: 0.0,
                    line_items: vec![LineItem {
                        title: "B".into(),
                        quantity: 1,
                        product_id: Some(2),
                        price: None,
                    }],
                    discount_codes: vec![],
                },
            ],
            products: vec![
                Product {
                    id: 1,
                    title: "A".into(),
                    variants: vec![],
                },
                Product {
                    id: 2,
                    title: "B".into(),
                    variants: vec![Variant {
                        id: None,
                        title: None,
                        inventory_quantity: 9,
                    }],
                },
            ],
            fail_products: false,
        }
    }

    #[tokio::test]
    async fn test_analyze_returns_parsed_reply() {
        let ai = MockBackend::with_reply(REPLY);
        let analyzer = BusinessSnapshotAnalyzer::new(fixture(), ai.clone());

        let result = analyzer.analyze_at(now()).await.unwrap();
        assert_eq!(result.insights, vec!["x", "y", "z"]);
        assert_eq!(ai.calls(), 1);

        let prompt = ai.last_prompt().unwrap();
        assert!(prompt.contains(r#"[{"title":"A","quantity":2}]"#));
    }

    #[tokio::test]
    async fn test_windowed_orders_drive_slow_sellers() {
        let analyzer = BusinessSnapshotAnalyzer::new(fixture(), MockBackend::new());

        let snapshot = analyzer.collect_snapshot(now()).await.unwrap();
        assert_eq!(snapshot.orders.len(), 1);

        // B only sold two months ago, so it counts as slow
        let summary = snapshot.summarize().unwrap();
        assert_eq!(summary.slow_sellers, vec!["B"]);
    }

    #[tokio::test]
    async fn test_missing_report_skips_ai_call() {
        let ai = MockBackend::with_reply(REPLY);
        let source = FixtureSource {
            report: None,
            ..fixture()
        };
        let analyzer = BusinessSnapshotAnalyzer::new(source, ai.clone());

        let err = analyzer.analyze_at(now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_read_failure_is_upstream() {
        let ai = MockBackend::with_reply(REPLY);
        let source = FixtureSource {
            fail_products: true,
            ..fixture()
        };
        let analyzer = BusinessSnapshotAnalyzer::new(source, ai.clone());

        let err = analyzer.analyze_at(now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_ai_failure_is_upstream() {
        let analyzer = BusinessSnapshotAnalyzer::new(fixture(), MockBackend::failing());

        let err = analyzer.analyze_at(now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_bad_response() {
        let ai = MockBackend::with_reply("Tôi không chắc.");
        let analyzer = BusinessSnapshotAnalyzer::new(fixture(), ai);

        let err = analyzer.analyze_at(now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadAIResponse);
    }
}
