//! Goal CLI commands

use chrono::Utc;
use clap::Subcommand;

use super::{parse_amount, parse_day, parse_value};
use crate::config::settings::Settings;
use crate::display::{format_goal_details, format_goal_list};
use crate::error::{FinanceError, FinanceResult};
use crate::models::{AmountOperation, Milestone, Owner};
use crate::services::{CreateGoalInput, GoalPatch, GoalService};
use crate::storage::Storage;

fn parse_milestones(raw: &[String]) -> FinanceResult<Vec<Milestone>> {
    raw.iter()
        .map(|m| Milestone::parse(m).map_err(FinanceError::Validation))
        .collect()
}

/// Goal subcommands
#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a savings goal
    Add {
        name: String,
        /// Target amount
        target: String,
        /// Deadline (YYYY-MM-DD), must be in the future
        deadline: String,
        /// Amount already saved
        #[arg(long)]
        current: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        /// Milestone as AMOUNT@YYYY-MM-DD (repeatable)
        #[arg(short, long = "milestone")]
        milestones: Vec<String>,
    },
    /// List goals by deadline
    List,
    /// Show a goal with its progress
    Show { id: String },
    /// Edit a goal
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        target: Option<String>,
        #[arg(short, long)]
        deadline: Option<String>,
        /// Replace all milestones (repeatable AMOUNT@YYYY-MM-DD)
        #[arg(short, long = "milestone")]
        milestones: Vec<String>,
    },
    /// Change the saved amount: add, subtract or set
    Amount {
        id: String,
        operation: String,
        amount: String,
    },
    /// Flip a goal between completed and in progress
    Toggle { id: String },
    /// Delete a goal
    Delete { id: String },
}

/// Handle a goal command
pub fn handle_goal_command(
    storage: &Storage,
    settings: &Settings,
    owner: &Owner,
    cmd: GoalCommands,
) -> FinanceResult<()> {
    let service = GoalService::new(storage);
    let today = Utc::now().date_naive();

    match cmd {
        GoalCommands::Add {
            name,
            target,
            deadline,
            current,
            currency,
            milestones,
        } => {
            let input = CreateGoalInput {
                name,
                target_amount: parse_amount(&target)?,
                current_amount: current.as_deref().map(parse_amount).transpose()?,
                deadline: parse_day(&deadline)?,
                currency: currency.unwrap_or_else(|| settings.default_currency.clone()),
                milestones: parse_milestones(&milestones)?,
            };
            let goal = service.create(owner, input)?;
            println!("Created goal {}: {}", goal.id, goal);
        }

        GoalCommands::List => {
            print!("{}", format_goal_list(&service.list(owner)?, today));
        }

        GoalCommands::Show { id } => {
            let goal = service.find(owner, &id)?;
            print!("{}", format_goal_details(&goal, today));
        }

        GoalCommands::Edit {
            id,
            name,
            target,
            deadline,
            milestones,
        } => {
            let goal = service.find(owner, &id)?;
            let patch = GoalPatch {
                name,
                target_amount: target.as_deref().map(parse_amount).transpose()?,
                deadline: deadline.as_deref().map(parse_day).transpose()?,
                milestones: if milestones.is_empty() {
                    None
                } else {
                    Some(parse_milestones(&milestones)?)
                },
            };
            let updated = service.update(owner, goal.id, patch)?;
            println!("Updated goal {}: {}", updated.id, updated);
        }

        GoalCommands::Amount {
            id,
            operation,
            amount,
        } => {
            let goal = service.find(owner, &id)?;
            let operation: AmountOperation = parse_value(&operation)?;
            let update = service.update_amount(owner, goal.id, operation, parse_amount(&amount)?)?;

            println!("Goal {}: {}", update.goal.id, update.goal);
            for milestone in &update.reached {
                println!("Milestone reached: {} by {}", milestone.amount, milestone.date);
            }
            if update.completed_now {
                println!("Goal '{}' completed!", update.goal.name);
            }
        }

        GoalCommands::Toggle { id } => {
            let goal = service.find(owner, &id)?;
            let toggled = service.toggle(owner, goal.id)?;
            let state = if toggled.is_completed { "completed" } else { "in progress" };
            println!("Goal {} is now {}", toggled.id, state);
        }

        GoalCommands::Delete { id } => {
            let goal = service.find(owner, &id)?;
            service.delete(owner, goal.id)?;
            println!("Deleted goal {}: {}", goal.id, goal.name);
        }
    }

    Ok(())
}
