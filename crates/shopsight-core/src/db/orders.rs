//! Order and abandoned checkout operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{format_timestamp, parse_json_column, parse_timestamp, Database};
use crate::error::Result;
use crate::models::{AbandonedCheckout, Order};

pub(crate) fn upsert_order_with(conn: &Connection, order: &Order) -> Result<()> {
    let line_items = serde_json::to_string(&order.line_items)?;
    let discount_codes = serde_json::to_string(&order.discount_codes)?;

    conn.execute(
        r#"
        INSERT INTO orders (id, created_at, total_price, line_items, discount_codes)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            created_at = excluded.created_at,
            total_price = excluded.total_price,
            line_items = excluded.line_items,
            discount_codes = excluded.discount_codes
        "#,
        params![
            order.id,
            format_timestamp(&order.created_at),
            order.total_price,
            line_items,
            discount_codes
        ],
    )?;
    Ok(())
}

pub(crate) fn upsert_abandoned_checkout_with(
    conn: &Connection,
    checkout: &AbandonedCheckout,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO abandoned_checkouts (id, created_at, total_price)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            created_at = excluded.created_at,
            total_price = excluded.total_price
        "#,
        params![
            checkout.id,
            format_timestamp(&checkout.created_at),
            checkout.total_price
        ],
    )?;
    Ok(())
}

impl Database {
    /// Insert or replace an order (keyed by platform order id)
    pub fn upsert_order(&self, order: &Order) -> Result<()> {
        upsert_order_with(&*self.conn()?, order)
    }

    /// List orders created at or after `since`, oldest first
    pub fn list_orders_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, created_at, total_price, line_items, discount_codes
            FROM orders
            WHERE created_at >= ?
            ORDER BY created_at ASC, id ASC
            "#,
        )?;

        let orders = stmt
            .query_map(params![format_timestamp(&since)], |row| {
                let created_at: String = row.get(1)?;
                let line_items: String = row.get(3)?;
                let discount_codes: String = row.get(4)?;
                Ok(Order {
                    id: row.get(0)?,
                    created_at: parse_timestamp(1, &created_at)?,
                    total_price: row.get(2)?,
                    line_items: parse_json_column(3, &line_items)?,
                    discount_codes: parse_json_column(4, &discount_codes)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(orders)
    }

    pub fn upsert_abandoned_checkout(&self, checkout: &AbandonedCheckout) -> Result<()> {
        upsert_abandoned_checkout_with(&*self.conn()?, checkout)
    }

    /// List abandoned checkouts created at or after `since`
    pub fn list_abandoned_checkouts_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AbandonedCheckout>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, created_at, total_price
            FROM abandoned_checkouts
            WHERE created_at >= ?
            ORDER BY created_at ASC, id ASC
            "#,
        )?;

        let checkouts = stmt
            .query_map(params![format_timestamp(&since)], |row| {
                let created_at: String = row.get(1)?;
                Ok(AbandonedCheckout {
                    id: row.get(0)?,
                    created_at: parse_timestamp(1, &created_at)?,
                    total_price: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(checkouts)
    }
}
