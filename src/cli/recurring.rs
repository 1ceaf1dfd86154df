//! Recurring series CLI commands
//!
//! `run` is the entry point for external timers (cron, systemd timers):
//! it fires everything due at the moment it is invoked.

use chrono::Utc;
use clap::Subcommand;

use super::{end_of_day, parse_day, parse_timestamp, parse_value};
use crate::display::{
    format_preview, format_run_report, format_series_details, format_series_list,
};
use crate::error::FinanceResult;
use crate::models::{Frequency, Owner, RecurrenceRule};
use crate::services::RecurringService;
use crate::storage::Storage;

/// Recurring subcommands
#[derive(Subcommand)]
pub enum RecurringCommands {
    /// List recurring series
    List,
    /// Show one series and its next trigger times
    Show {
        id: String,
        /// Number of upcoming occurrences to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
    /// Preview trigger times without saving anything
    Preview {
        /// Template date (YYYY-MM-DD or RFC 3339)
        start: String,
        /// daily, weekly or monthly
        frequency: String,
        #[arg(long)]
        until: Option<String>,
        #[arg(long)]
        count: Option<u32>,
        /// Number of occurrences to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Cancel a series
    Cancel { id: String },
    /// Fire every due series
    Run {
        /// Fire due series of every user, not just the current one
        #[arg(long)]
        all_users: bool,
    },
}

pub fn handle_recurring_command(
    storage: &Storage,
    owner: &Owner,
    cmd: RecurringCommands,
) -> FinanceResult<()> {
    let service = RecurringService::new(storage);

    match cmd {
        RecurringCommands::List => {
            print!("{}", format_series_list(&service.list_series(owner)?));
        }

        RecurringCommands::Show { id, limit } => {
            let series = service.find_series(owner, &id)?;
            print!("{}", format_series_details(&series, limit));
        }

        RecurringCommands::Preview {
            start,
            frequency,
            until,
            count,
            limit,
        } => {
            let rule = RecurrenceRule {
                frequency: parse_value::<Frequency>(&frequency)?,
                end_date: until.as_deref().map(parse_day).transpose()?.map(end_of_day),
                count,
            };
            let triggers = service.preview(parse_timestamp(&start)?, &rule, limit)?;
            print!("{}", format_preview(&triggers));
        }

        RecurringCommands::Cancel { id } => {
            let series = service.find_series(owner, &id)?;
            let series = service.cancel_series(owner, series.id)?;
            println!("Series {} is {}", series.id, series.state);
        }

        RecurringCommands::Run { all_users } => {
            let now = Utc::now();
            let report = if all_users {
                service.run_due(now)?
            } else {
                service.run_due_for(owner, now)?
            };
            print!("{}", format_run_report(&report));
        }
    }

    Ok(())
}
