//! Product, coupon and customer operations
//!
//! Full-table listings return rows in primary key order, which is the
//! platform's creation order.

use rusqlite::{params, Connection};

use super::{parse_json_column, Database};
use crate::error::Result;
use crate::models::{Coupon, Customer, Product};

pub(crate) fn upsert_product_with(conn: &Connection, product: &Product) -> Result<()> {
    let variants = serde_json::to_string(&product.variants)?;
    conn.execute(
        r#"
        INSERT INTO products (id, title, variants)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            variants = excluded.variants
        "#,
        params![product.id, product.title, variants],
    )?;
    Ok(())
}

pub(crate) fn upsert_coupon_with(conn: &Connection, coupon: &Coupon) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO coupons (id, code) VALUES (?, ?)
        ON CONFLICT(id) DO UPDATE SET code = excluded.code
        "#,
        params![coupon.id, coupon.code],
    )?;
    Ok(())
}

pub(crate) fn upsert_customer_with(conn: &Connection, customer: &Customer) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO customers (id, first_name, last_name, total_spent, orders_count)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            total_spent = excluded.total_spent,
            orders_count = excluded.orders_count
        "#,
        params![
            customer.id,
            customer.first_name,
            customer.last_name,
            customer.total_spent,
            customer.orders_count
        ],
    )?;
    Ok(())
}

impl Database {
    pub fn upsert_product(&self, product: &Product) -> Result<()> {
        upsert_product_with(&*self.conn()?, product)
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, title, variants FROM products ORDER BY id")?;

        let products = stmt
            .query_map([], |row| {
                let variants: String = row.get(2)?;
                Ok(Product {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    variants: parse_json_column(2, &variants)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(products)
    }

    pub fn upsert_coupon(&self, coupon: &Coupon) -> Result<()> {
        upsert_coupon_with(&*self.conn()?, coupon)
    }

    pub fn list_coupons(&self) -> Result<Vec<Coupon>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, code FROM coupons ORDER BY id")?;

        let coupons = stmt
            .query_map([], |row| {
                Ok(Coupon {
                    id: row.get(0)?,
                    code: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(coupons)
    }

    pub fn upsert_customer(&self, customer: &Customer) -> Result<()> {
        upsert_customer_with(&*self.conn()?, customer)
    }

    /// List all customers, biggest spenders first
    pub fn list_customers_by_spend(&self) -> Result<Vec<Customer>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, first_name, last_name, total_spent, orders_count
            FROM customers
            ORDER BY total_spent DESC, id ASC
            "#,
        )?;

        let customers = stmt
            .query_map([], |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    total_spent: row.get(3)?,
                    orders_count: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(customers)
    }
}
