//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Show record counts

use std::path::Path;

use anyhow::{Context, Result};
use shopsight_core::db::Database;
use shopsight_core::TableCounts;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Load store data: shopsight load --file bundle.json");
    println!("  2. Run an analysis: shopsight analyze");
    println!("  3. Start the API: shopsight serve");

    Ok(())
}

pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;
    let counts = db.counts().context("Failed to count records")?;

    println!("📊 Shopsight status ({})", db_path.display());
    println!();
    print!("{}", format_counts(&counts));

    if counts.daily_reports == 0 {
        println!();
        println!("💡 No daily report yet - analysis will return 404 until one is loaded");
    }

    Ok(())
}

/// One aligned line per table
pub fn format_counts(counts: &TableCounts) -> String {
    let rows = [
        ("Daily reports", counts.daily_reports),
        ("Financial events", counts.financial_events),
        ("Orders", counts.orders),
        ("Products", counts.products),
        ("Coupons", counts.coupons),
        ("Customers", counts.customers),
        ("Abandoned checkouts", counts.abandoned_checkouts),
    ];

    let mut out = String::new();
    for (label, count) in rows {
        out.push_str(&format!("   {:<20} {:>6}\n", label, count));
    }
    out.push_str(&format!(
        "   {:<20} {:>6}\n",
        "Business settings",
        if counts.has_settings { "yes" } else { "no" }
    ));
    out
}
