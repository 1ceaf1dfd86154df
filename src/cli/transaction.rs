//! Transaction CLI commands
//!
//! Implements CLI commands for transaction management.

use clap::Subcommand;

use super::{end_of_day, parse_amount, parse_day, parse_range, parse_timestamp, parse_value};
use crate::config::settings::Settings;
use crate::display::{format_transaction_details, format_transaction_register};
use crate::error::{FinanceError, FinanceResult};
use crate::models::{Frequency, Owner, RecurrenceRule, TransactionKind};
use crate::services::{
    CreateTransactionInput, GoalService, PredictionService, TransactionFilter, TransactionPatch,
    TransactionService,
};
use crate::storage::Storage;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a new transaction
    Add {
        /// income or expense
        kind: String,
        /// Amount (e.g., "50.00")
        amount: String,
        /// Category; predicted from the description when omitted
        #[arg(short, long)]
        category: Option<String>,
        /// Currency code, defaults to the configured currency
        #[arg(long)]
        currency: Option<String>,
        /// Date (YYYY-MM-DD or RFC 3339), defaults to now
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Repeat daily, weekly or monthly
        #[arg(short, long)]
        recurring: Option<String>,
        /// Last day a repetition may fall on (YYYY-MM-DD)
        #[arg(long, requires = "recurring")]
        until: Option<String>,
        /// Maximum number of repetitions
        #[arg(long, requires = "recurring")]
        count: Option<u32>,
        /// Goal this transaction contributes to
        #[arg(short, long)]
        goal: Option<String>,
        #[arg(long)]
        tax: Option<String>,
    },
    /// List transactions
    List {
        /// Filter by kind (income or expense)
        #[arg(short, long)]
        kind: Option<String>,
        /// Filter by category name
        #[arg(short = 'C', long)]
        category: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(short, long)]
        tag: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show transaction details
    Show {
        /// Transaction ID
        id: String,
    },
    /// Edit a transaction
    Edit {
        /// Transaction ID
        id: String,
        #[arg(short, long)]
        kind: Option<String>,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Replace all tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Link to a goal
        #[arg(short, long, conflicts_with = "no_goal")]
        goal: Option<String>,
        /// Remove the goal link
        #[arg(long)]
        no_goal: bool,
        #[arg(long)]
        tax: Option<String>,
    },
    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    owner: &Owner,
    cmd: TransactionCommands,
) -> FinanceResult<()> {
    let service = TransactionService::new(storage);

    match cmd {
        TransactionCommands::Add {
            kind,
            amount,
            category,
            currency,
            date,
            description,
            tags,
            recurring,
            until,
            count,
            goal,
            tax,
        } => {
            let kind: TransactionKind = parse_value(&kind)?;
            let amount = parse_amount(&amount)?;
            let occurred_at = match date {
                Some(d) => parse_timestamp(&d)?,
                None => chrono::Utc::now(),
            };

            let category = match category {
                Some(c) => c,
                None => {
                    let desc = description.as_deref().ok_or_else(|| {
                        FinanceError::Validation(
                            "Either --category or --description is required".into(),
                        )
                    })?;
                    let prediction = PredictionService::new(storage).predict(owner, desc)?;
                    println!(
                        "Predicted category: {} ({})",
                        prediction.category, prediction.source
                    );
                    prediction.category
                }
            };

            let recurrence = match recurring {
                Some(freq) => Some(RecurrenceRule {
                    frequency: parse_value::<Frequency>(&freq)?,
                    end_date: until.as_deref().map(parse_day).transpose()?.map(end_of_day),
                    count,
                }),
                None => None,
            };

            let goal = match goal {
                Some(reference) => Some(GoalService::new(storage).find(owner, &reference)?.id),
                None => None,
            };

            let input = CreateTransactionInput {
                kind,
                category,
                amount,
                currency: currency.unwrap_or_else(|| settings.default_currency.clone()),
                occurred_at,
                description,
                tags,
                recurrence,
                goal,
                tax: tax.as_deref().map(parse_amount).transpose()?,
            };

            let txn = service.create(owner, input)?;
            println!("Created transaction {}", txn.id);
            print!("{}", format_transaction_details(&txn));
        }

        TransactionCommands::List {
            kind,
            category,
            from,
            to,
            tag,
            limit,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(kind) = kind {
                filter = filter.kind(parse_value(&kind)?);
            }
            if let Some(category) = category {
                filter = filter.category(category);
            }
            if let Some((start, end)) = parse_range(from.as_deref(), to.as_deref())? {
                filter = filter.date_range(start, end);
            }
            if let Some(tag) = tag {
                filter = filter.tag(tag);
            }

            let transactions = service.list(owner, &filter)?;
            print!("{}", format_transaction_register(&transactions));
        }

        TransactionCommands::Show { id } => {
            let txn = service.find(owner, &id)?;
            print!("{}", format_transaction_details(&txn));
        }

        TransactionCommands::Edit {
            id,
            kind,
            amount,
            category,
            currency,
            date,
            description,
            tags,
            goal,
            no_goal,
            tax,
        } => {
            let txn = service.find(owner, &id)?;

            let goal = if no_goal {
                Some(None)
            } else {
                match goal {
                    Some(reference) => {
                        Some(Some(GoalService::new(storage).find(owner, &reference)?.id))
                    }
                    None => None,
                }
            };

            let patch = TransactionPatch {
                kind: kind.as_deref().map(parse_value).transpose()?,
                category,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                currency,
                occurred_at: date.as_deref().map(parse_timestamp).transpose()?,
                description,
                tags: if tags.is_empty() { None } else { Some(tags) },
                goal,
                tax: tax.as_deref().map(parse_amount).transpose()?,
            };

            let updated = service.update(owner, txn.id, patch)?;
            println!("Updated transaction {}", updated.id);
            print!("{}", format_transaction_details(&updated));
        }

        TransactionCommands::Delete { id } => {
            let txn = service.find(owner, &id)?;
            service.delete(owner, txn.id)?;
            println!("Deleted transaction {} ({})", txn.id, txn);
        }
    }

    Ok(())
}
