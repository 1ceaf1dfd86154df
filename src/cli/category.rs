//! Category prediction CLI commands

use clap::Subcommand;

use crate::error::FinanceResult;
use crate::models::Owner;
use crate::services::PredictionService;
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Suggest a category for a description
    Predict { description: String },
    /// Record that a description belongs to a category
    Learn {
        description: String,
        category: String,
    },
    /// Show learned mappings
    List,
}

pub fn handle_category_command(
    storage: &Storage,
    owner: &Owner,
    cmd: CategoryCommands,
) -> FinanceResult<()> {
    let service = PredictionService::new(storage);

    match cmd {
        CategoryCommands::Predict { description } => {
            let prediction = service.predict(owner, &description)?;
            println!("{} ({})", prediction.category, prediction.source);
        }

        CategoryCommands::Learn {
            description,
            category,
        } => {
            let learned = service.learn(owner, &description, &category)?;
            println!(
                "'{}' -> {} (seen {} times)",
                learned.description, learned.category, learned.frequency
            );
        }

        CategoryCommands::List => {
            let mappings = service.list(owner)?;
            if mappings.is_empty() {
                println!("No learned categories.");
            }
            for m in mappings {
                println!("{:<30} {:<16} {:>4}", m.description, m.category, m.frequency);
            }
        }
    }

    Ok(())
}
