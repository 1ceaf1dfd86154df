//! Display formatting for terminal output
//!
//! Provides utilities for formatting data models and service results for
//! terminal display.

pub mod budget;
pub mod goal;
pub mod recurring;
pub mod report;
pub mod transaction;

pub use budget::{
    format_alerts, format_budget_analytics, format_budget_details, format_budget_list,
    format_budget_summary,
};
pub use goal::{format_goal_details, format_goal_list};
pub use recurring::{
    format_preview, format_run_report, format_series_details, format_series_list,
};
pub use transaction::{format_transaction_details, format_transaction_register};

/// Cut a string to at most `max` characters, marking the cut with "..."
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
