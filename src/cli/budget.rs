//! Budget CLI commands
//!
//! Implements CLI commands for budget management, progress, summary and
//! alerts.

use clap::Subcommand;

use super::{parse_amount, parse_value};
use crate::config::settings::Settings;
use crate::display::{
    format_alerts, format_budget_analytics, format_budget_details, format_budget_list,
    format_budget_summary,
};
use crate::error::FinanceResult;
use crate::models::{BudgetPeriod, BudgetStatus, Owner};
use crate::services::{BudgetPatch, BudgetService, CreateBudgetInput};
use crate::storage::Storage;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create a budget for a category
    Add {
        category: String,
        /// Cap per period (e.g., "200" or "200.00")
        amount: String,
        /// daily, weekly, monthly or yearly
        #[arg(short, long, default_value = "monthly")]
        period: String,
        /// Alert threshold in (0, 1], defaults to the configured threshold
        #[arg(short, long)]
        threshold: Option<f64>,
        #[arg(short = 'D', long)]
        description: Option<String>,
    },
    /// List budgets with current progress
    List,
    /// Show a budget's progress in its current window
    Show {
        /// Budget ID
        id: String,
        /// Also show all-time statistics for the category
        #[arg(long)]
        analytics: bool,
    },
    /// Edit a budget
    Edit {
        id: String,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        period: Option<String>,
        #[arg(short, long)]
        threshold: Option<f64>,
        #[arg(short = 'D', long)]
        description: Option<String>,
    },
    /// Set a budget's status (active, paused or archived)
    Status { id: String, status: String },
    /// Delete a budget
    Delete { id: String },
    /// Totals and health score across active budgets
    Summary,
    /// Active budgets at or past their alert threshold
    Alerts,
}

/// Handle a budget command
pub fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    owner: &Owner,
    cmd: BudgetCommands,
) -> FinanceResult<()> {
    let service = BudgetService::new(storage).week_start(settings.week_start.weekday());

    match cmd {
        BudgetCommands::Add {
            category,
            amount,
            period,
            threshold,
            description,
        } => {
            let input = CreateBudgetInput {
                category,
                amount: parse_amount(&amount)?,
                period: parse_value::<BudgetPeriod>(&period)?,
                alert_threshold: Some(threshold.unwrap_or(settings.default_alert_threshold)),
                description,
            };
            let budget = service.create(owner, input)?;
            println!("Created budget {}: {}", budget.id, budget);
        }

        BudgetCommands::List => {
            let rows = service
                .list(owner)?
                .into_iter()
                .map(|b| service.progress(owner, b.id).map(|p| (b, p)))
                .collect::<FinanceResult<Vec<_>>>()?;
            print!("{}", format_budget_list(&rows));
        }

        BudgetCommands::Show { id, analytics } => {
            let budget = service.find(owner, &id)?;
            let progress = service.progress(owner, budget.id)?;
            print!("{}", format_budget_details(&budget, &progress));
            if analytics {
                println!();
                print!(
                    "{}",
                    format_budget_analytics(&service.analytics(owner, budget.id)?)
                );
            }
        }

        BudgetCommands::Edit {
            id,
            category,
            amount,
            period,
            threshold,
            description,
        } => {
            let budget = service.find(owner, &id)?;
            let patch = BudgetPatch {
                category,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                period: period.as_deref().map(parse_value).transpose()?,
                alert_threshold: threshold,
                description,
            };
            let updated = service.update(owner, budget.id, patch)?;
            println!("Updated budget {}: {}", updated.id, updated);
        }

        BudgetCommands::Status { id, status } => {
            let budget = service.find(owner, &id)?;
            let status: BudgetStatus = parse_value(&status)?;
            let updated = service.set_status(owner, budget.id, status)?;
            println!("Budget {} is now {}", updated.id, updated.status);
        }

        BudgetCommands::Delete { id } => {
            let budget = service.find(owner, &id)?;
            service.delete(owner, budget.id)?;
            println!("Deleted budget {}: {}", budget.id, budget);
        }

        BudgetCommands::Summary => {
            print!("{}", format_budget_summary(&service.summary(owner)?));
        }

        BudgetCommands::Alerts => {
            print!("{}", format_alerts(&service.alerts(owner)?));
        }
    }

    Ok(())
}
