//! Export module for FinTrack
//!
//! Provides per-owner data export in multiple formats:
//! - CSV: transactions, budgets or goals (spreadsheet-compatible)
//! - JSON: machine-readable full export
//! - YAML: human-readable full export

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::{export_budgets_csv, export_goals_csv, export_transactions_csv};
pub use json::{export_owner_json, import_from_json, OwnerExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_owner_yaml, import_from_yaml};
