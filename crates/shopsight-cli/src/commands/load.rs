//! Bundle loading command

use std::path::Path;

use anyhow::{Context, Result};
use shopsight_core::db::Database;
use shopsight_core::{ImportBundle, ImportStats};

use super::open_db;

pub fn cmd_load(db_path: &Path, file: &Path, no_encrypt: bool) -> Result<()> {
    println!("📥 Loading {}...", file.display());

    let db = open_db(db_path, no_encrypt)?;
    let stats = load_bundle(&db, file)?;

    println!("   Daily reports:       {}", stats.daily_reports);
    println!(
        "   Business settings:   {}",
        if stats.settings_saved { "saved" } else { "unchanged" }
    );
    println!("   Financial events:    {}", stats.financial_events);
    println!("   Orders:              {}", stats.orders);
    println!("   Products:            {}", stats.products);
    println!("   Coupons:             {}", stats.coupons);
    println!("   Customers:           {}", stats.customers);
    println!("   Abandoned checkouts: {}", stats.abandoned_checkouts);
    println!("✅ Loaded {} records", stats.total());

    Ok(())
}

/// Read and import a bundle file
pub fn load_bundle(db: &Database, file: &Path) -> Result<ImportStats> {
    let bundle = ImportBundle::from_path(file)
        .with_context(|| format!("Failed to read bundle {}", file.display()))?;
    db.import_bundle(&bundle)
        .context("Failed to import bundle (no records were written)")
}
