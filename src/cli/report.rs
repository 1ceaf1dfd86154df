//! Report CLI commands

use chrono::Utc;
use clap::Subcommand;

use super::parse_range;
use crate::config::settings::Settings;
use crate::error::FinanceResult;
use crate::models::Owner;
use crate::reports::{CategoryTotalsReport, MonthlyReport, OverviewReport, RecommendationReport};
use crate::storage::Storage;

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Net totals per category
    Categories {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Write CSV instead of a table
        #[arg(long)]
        csv: bool,
    },
    /// Income and expenses per month
    Monthly,
    /// Income, expenses, net and savings rate
    Overview {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Suggestions for budgets close to their cap
    Recommendations,
}

pub fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    owner: &Owner,
    cmd: ReportCommands,
) -> FinanceResult<()> {
    match cmd {
        ReportCommands::Categories { from, to, csv } => {
            let range = parse_range(from.as_deref(), to.as_deref())?;
            let report = CategoryTotalsReport::generate(storage, owner, range)?;
            if csv {
                report.export_csv(std::io::stdout().lock())?;
            } else {
                print!("{}", report.format_terminal());
            }
        }

        ReportCommands::Monthly => {
            print!("{}", MonthlyReport::generate(storage, owner)?.format_terminal());
        }

        ReportCommands::Overview { from, to } => {
            let range = parse_range(from.as_deref(), to.as_deref())?;
            print!("{}", OverviewReport::generate(storage, owner, range)?.format_terminal());
        }

        ReportCommands::Recommendations => {
            let report = RecommendationReport::generate(
                storage,
                owner,
                Utc::now(),
                settings.week_start.weekday(),
            )?;
            print!("{}", report.format_terminal());
        }
    }

    Ok(())
}
