//! Prompt rendering for the business analysis
//!
//! The template is embedded at compile time and filled with `{{var}}`
//! placeholders. All formatting (currency, dates, JSON encoding of lists)
//! happens here so the aggregation in `snapshot` stays numeric.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;

use super::snapshot::SnapshotSummary;

const BUSINESS_ANALYSIS: &str = include_str!("../../prompts/business_analysis.md");

/// Monthly settings are spread over a fixed 30-day month
const DAYS_PER_MONTH: f64 = 30.0;

/// Builds the analysis prompt from an aggregated snapshot
pub struct PromptBuilder<'a> {
    summary: &'a SnapshotSummary,
}

#[derive(Serialize)]
struct EventLine<'a> {
    name: &'a str,
    amount: String,
    due_date: String,
}

#[derive(Serialize)]
struct CustomerLine<'a> {
    name: &'a str,
    total_spent: String,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(summary: &'a SnapshotSummary) -> Self {
        Self { summary }
    }

    /// Render the full prompt text
    pub fn build(&self) -> Result<String> {
        let s = self.summary;

        let events: Vec<EventLine> = s
            .upcoming_events
            .iter()
            .map(|e| EventLine {
                name: &e.event_name,
                amount: format_vnd(e.amount),
                due_date: format_date(e.due_date),
            })
            .collect();
        let customers: Vec<CustomerLine> = s
            .top_customers
            .iter()
            .map(|c| CustomerLine {
                name: &c.name,
                total_spent: format_vnd(c.total_spent),
            })
            .collect();

        let vars = [
            ("report_date", format_date(s.report.report_date)),
            ("total_revenue", format_vnd(s.report.total_revenue)),
            ("total_profit", format_vnd(s.report.total_profit)),
            ("today_order_count", s.today_order_count.to_string()),
            (
                "daily_fixed_cost",
                format_vnd(s.settings.monthly_fixed_cost() / DAYS_PER_MONTH),
            ),
            (
                "daily_profit_target",
                format_vnd(s.settings.monthly_profit_target / DAYS_PER_MONTH),
            ),
            ("upcoming_events", serde_json::to_string(&events)?),
            ("top_products", serde_json::to_string(&s.top_products)?),
            ("coupon_usage", serde_json::to_string(&s.coupon_usage)?),
            ("low_stock", serde_json::to_string(&s.low_stock)?),
            ("slow_sellers", serde_json::to_string(&s.slow_sellers)?),
            ("coupon_count", s.coupon_count.to_string()),
            ("top_customers", serde_json::to_string(&customers)?),
            (
                "abandoned_checkout_count",
                s.abandoned_checkout_count.to_string(),
            ),
            ("recent_order_count", s.recent_order_count.to_string()),
        ];

        Ok(render(BUSINESS_ANALYSIS, &vars))
    }
}

/// Replace every `{{key}}` with its value
fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let pattern = format!("{{{{{}}}}}", key);
        result = result.replace(&pattern, value);
    }
    result
}

/// Format an amount as Vietnamese dong: `1.000.000 ₫`
///
/// Rounded to whole dong; the currency has no minor unit in practice.
pub fn format_vnd(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{} ₫", sign, grouped)
}

/// `dd/mm/yyyy`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
