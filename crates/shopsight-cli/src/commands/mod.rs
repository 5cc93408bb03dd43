//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, status) and shared utilities (open_db)
//! - `load` - Bundle loading
//! - `analyze` - AI business analysis
//! - `serve` - Web server command

pub mod analyze;
pub mod core;
pub mod load;
pub mod serve;

// Re-export command functions for main.rs
pub use analyze::*;
pub use core::*;
pub use load::*;
pub use serve::*;
