//! Database module for sitewatch.
//!
//! Persists the list of monitored endpoints in SQLite.

mod models;
mod store;

pub use models::*;
pub use store::*;
