//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod audit;
pub mod budget;
pub mod category;
pub mod export;
pub mod goal;
pub mod recurring;
pub mod report;
pub mod transaction;

pub use audit::handle_audit_command;
pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use export::{handle_export_command, ExportCommands};
pub use goal::{handle_goal_command, GoalCommands};
pub use recurring::{handle_recurring_command, RecurringCommands};
pub use report::{handle_report_command, ReportCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::{FinanceError, FinanceResult};
use crate::models::Money;

pub(crate) fn parse_amount(amount: &str) -> FinanceResult<Money> {
    Money::parse(amount).map_err(|e| {
        FinanceError::Validation(format!(
            "Invalid amount format: '{}'. Use format like '50.00' or '100'. Error: {}",
            amount, e
        ))
    })
}

pub(crate) fn parse_day(date_str: &str) -> FinanceResult<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|_| {
        FinanceError::Validation(format!(
            "Invalid date format: '{}'. Use YYYY-MM-DD",
            date_str
        ))
    })
}

/// Accept an RFC 3339 timestamp or a plain date (midnight UTC)
pub(crate) fn parse_timestamp(value: &str) -> FinanceResult<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value.trim()) {
        return Ok(at.with_timezone(&Utc));
    }
    Ok(start_of_day(parse_day(value)?))
}

pub(crate) fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

/// Last representable instant of `day`, for inclusive end dates
pub(crate) fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&day.and_time(last))
}

/// Build an inclusive range from optional `--from` / `--to` dates
pub(crate) fn parse_range(
    from: Option<&str>,
    to: Option<&str>,
) -> FinanceResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    let start = match from {
        Some(f) => start_of_day(parse_day(f)?),
        None => DateTime::<Utc>::MIN_UTC,
    };
    let end = match to {
        Some(t) => end_of_day(parse_day(t)?),
        None => DateTime::<Utc>::MAX_UTC,
    };
    if start > end {
        return Err(FinanceError::Validation(format!(
            "Start date {} is after end date {}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )));
    }
    Ok(Some((start, end)))
}

pub(crate) fn parse_value<T>(value: &str) -> FinanceResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| FinanceError::Validation(e.to_string()))
}
