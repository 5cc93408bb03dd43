//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `reports` - Daily reports, business settings, financial events
//! - `orders` - Orders and abandoned checkouts
//! - `catalog` - Products, coupons, customers
//!
//! Nested platform documents (line items, discount codes, variants) are stored
//! as JSON text columns. Timestamps are stored as UTC `YYYY-MM-DD HH:MM:SS`
//! strings so range filters can compare them lexically.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::TableCounts;

mod catalog;
mod orders;
mod reports;

pub(crate) use catalog::{upsert_coupon_with, upsert_customer_with, upsert_product_with};
pub(crate) use orders::{upsert_abandoned_checkout_with, upsert_order_with};
pub(crate) use reports::{
    save_business_settings_with, upsert_daily_report_with, upsert_financial_event_with,
};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "SHOPSIGHT_DB_KEY";

/// `%.f` keeps sub-second precision and stays lexically ordered
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"shopsight-salt-1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Parse a stored timestamp column
pub(crate) fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| conversion_error(idx, e))
}

/// Parse a stored date column
pub(crate) fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

/// Parse a JSON text column into its nested document type
pub(crate) fn parse_json_column<T: DeserializeOwned>(idx: usize, s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| conversion_error(idx, e))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `SHOPSIGHT_DB_KEY` environment variable to be set.
    /// The database will be encrypted using SQLCipher with a key derived
    /// from the passphrase via Argon2.
    ///
    /// Returns an error if `SHOPSIGHT_DB_KEY` is not set. Use `new_unencrypted()`
    /// for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// WARNING: This creates an unencrypted database. Only use for development
    /// or testing.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Use with_init to set the key on every new connection
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because every pooled
    /// connection would otherwise see its own empty in-memory database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "shopsight_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let path = path.to_string_lossy().to_string();

        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Count records in every table
    pub fn counts(&self) -> Result<TableCounts> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?)
        };

        Ok(TableCounts {
            daily_reports: count("daily_reports")?,
            financial_events: count("financial_events")?,
            orders: count("orders")?,
            products: count("products")?,
            coupons: count("coupons")?,
            customers: count("customers")?,
            abandoned_checkouts: count("abandoned_checkouts")?,
            has_settings: count("business_settings")? > 0,
        })
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers, so the parallel snapshot
            -- reads can share the pool with an import in progress
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- End-of-day summaries
            CREATE TABLE IF NOT EXISTS daily_reports (
                id INTEGER PRIMARY KEY,
                report_date DATE NOT NULL UNIQUE,
                total_revenue REAL NOT NULL DEFAULT 0,
                total_profit REAL NOT NULL DEFAULT 0,
                total_orders INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Singleton row (id = 1)
            CREATE TABLE IF NOT EXISTS business_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                monthly_rent_cost REAL NOT NULL DEFAULT 0,
                monthly_staff_cost REAL NOT NULL DEFAULT 0,
                monthly_marketing_cost REAL NOT NULL DEFAULT 0,
                monthly_other_cost REAL NOT NULL DEFAULT 0,
                monthly_profit_target REAL NOT NULL DEFAULT 0,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS financial_events (
                id INTEGER PRIMARY KEY,
                event_name TEXT NOT NULL,
                amount REAL NOT NULL DEFAULT 0,
                due_date DATE NOT NULL,
                is_paid BOOLEAN NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_financial_events_due ON financial_events(is_paid, due_date);

            -- Orders synced from the commerce platform (ids are platform ids)
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY,
                created_at DATETIME NOT NULL,
                total_price REAL NOT NULL DEFAULT 0,
                line_items TEXT NOT NULL DEFAULT '[]',      -- JSON: [{title, quantity, product_id, price}]
                discount_codes TEXT NOT NULL DEFAULT '[]'   -- JSON: [{code, amount}]
            );

            CREATE INDEX IF NOT EXISTS idx_orders_created ON orders(created_at);

            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                variants TEXT NOT NULL DEFAULT '[]'         -- JSON: [{id, title, inventory_quantity}]
            );

            CREATE TABLE IF NOT EXISTS coupons (
                id INTEGER PRIMARY KEY,
                code TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY,
                first_name TEXT,
                last_name TEXT,
                total_spent REAL NOT NULL DEFAULT 0,
                orders_count INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_customers_spent ON customers(total_spent);

            CREATE TABLE IF NOT EXISTS abandoned_checkouts (
                id INTEGER PRIMARY KEY,
                created_at DATETIME NOT NULL,
                total_price REAL NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_abandoned_created ON abandoned_checkouts(created_at);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
