//! Daily report, business settings and financial event operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::{format_date, parse_date, Database};
use crate::error::Result;
use crate::models::{BusinessSettings, DailyReport, FinancialEvent};

/// One report per date: a row clashing on either `id` or `report_date` is replaced
pub(crate) fn upsert_daily_report_with(conn: &Connection, report: &DailyReport) -> Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO daily_reports (id, report_date, total_revenue, total_profit, total_orders)
        VALUES (?, ?, ?, ?, ?)
        "#,
        params![
            report.id,
            format_date(&report.report_date),
            report.total_revenue,
            report.total_profit,
            report.total_orders
        ],
    )?;
    Ok(())
}

pub(crate) fn save_business_settings_with(
    conn: &Connection,
    settings: &BusinessSettings,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO business_settings (
            id, monthly_rent_cost, monthly_staff_cost, monthly_marketing_cost,
            monthly_other_cost, monthly_profit_target
        ) VALUES (1, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            monthly_rent_cost = excluded.monthly_rent_cost,
            monthly_staff_cost = excluded.monthly_staff_cost,
            monthly_marketing_cost = excluded.monthly_marketing_cost,
            monthly_other_cost = excluded.monthly_other_cost,
            monthly_profit_target = excluded.monthly_profit_target,
            updated_at = CURRENT_TIMESTAMP
        "#,
        params![
            settings.monthly_rent_cost,
            settings.monthly_staff_cost,
            settings.monthly_marketing_cost,
            settings.monthly_other_cost,
            settings.monthly_profit_target
        ],
    )?;
    Ok(())
}

pub(crate) fn upsert_financial_event_with(conn: &Connection, event: &FinancialEvent) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO financial_events (id, event_name, amount, due_date, is_paid)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            event_name = excluded.event_name,
            amount = excluded.amount,
            due_date = excluded.due_date,
            is_paid = excluded.is_paid
        "#,
        params![
            event.id,
            event.event_name,
            event.amount,
            format_date(&event.due_date),
            event.is_paid
        ],
    )?;
    Ok(())
}

impl Database {
    /// Insert or replace a daily report
    pub fn upsert_daily_report(&self, report: &DailyReport) -> Result<()> {
        upsert_daily_report_with(&*self.conn()?, report)
    }

    /// Get the most recent daily report by report date
    pub fn get_latest_daily_report(&self) -> Result<Option<DailyReport>> {
        let conn = self.conn()?;
        let report = conn
            .query_row(
                r#"
                SELECT id, report_date, total_revenue, total_profit, total_orders
                FROM daily_reports
                ORDER BY report_date DESC
                LIMIT 1
                "#,
                [],
                |row| {
                    let date: String = row.get(1)?;
                    Ok(DailyReport {
                        id: row.get(0)?,
                        report_date: parse_date(1, &date)?,
                        total_revenue: row.get(2)?,
                        total_profit: row.get(3)?,
                        total_orders: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(report)
    }

    /// Replace the singleton settings row
    pub fn save_business_settings(&self, settings: &BusinessSettings) -> Result<()> {
        save_business_settings_with(&*self.conn()?, settings)
    }

    pub fn get_business_settings(&self) -> Result<Option<BusinessSettings>> {
        let conn = self.conn()?;
        let settings = conn
            .query_row(
                r#"
                SELECT monthly_rent_cost, monthly_staff_cost, monthly_marketing_cost,
                       monthly_other_cost, monthly_profit_target
                FROM business_settings
                WHERE id = 1
                "#,
                [],
                |row| {
                    Ok(BusinessSettings {
                        monthly_rent_cost: row.get(0)?,
                        monthly_staff_cost: row.get(1)?,
                        monthly_marketing_cost: row.get(2)?,
                        monthly_other_cost: row.get(3)?,
                        monthly_profit_target: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(settings)
    }

    pub fn upsert_financial_event(&self, event: &FinancialEvent) -> Result<()> {
        upsert_financial_event_with(&*self.conn()?, event)
    }

    /// List unpaid events due on or after `today`, soonest first
    pub fn list_upcoming_unpaid_events(&self, today: NaiveDate) -> Result<Vec<FinancialEvent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, event_name, amount, due_date, is_paid
            FROM financial_events
            WHERE is_paid = 0 AND due_date >= ?
            ORDER BY due_date ASC, id ASC
            "#,
        )?;

        let events = stmt
            .query_map(params![format_date(&today)], |row| {
                let due: String = row.get(3)?;
                Ok(FinancialEvent {
                    id: row.get(0)?,
                    event_name: row.get(1)?,
                    amount: row.get(2)?,
                    due_date: parse_date(3, &due)?,
                    is_paid: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }
}
