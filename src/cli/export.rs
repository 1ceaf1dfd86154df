//! Export CLI commands
//!
//! Writes to a file when `--output` is given, otherwise to stdout.

use clap::{Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::FinanceResult;
use crate::export::{
    export_budgets_csv, export_goals_csv, export_owner_json, export_owner_yaml,
    export_transactions_csv, import_from_json, import_from_yaml,
};
use crate::models::Owner;
use crate::storage::Storage;

/// Which collection a CSV export covers
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CsvTable {
    Transactions,
    Budgets,
    Goals,
}

/// Export subcommands
#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export one collection as CSV
    Csv {
        #[arg(value_enum, default_value = "transactions")]
        table: CsvTable,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export everything as JSON
    Json {
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Export everything as YAML
    Yaml {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that a JSON or YAML export file is readable and consistent
    Verify { file: PathBuf },
}

fn verify_export(file: &Path) -> FinanceResult<()> {
    let contents = fs::read_to_string(file)?;
    let is_yaml = matches!(
        file.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let export = if is_yaml {
        import_from_yaml(&contents)?
    } else {
        import_from_json(&contents)?
    };

    println!(
        "Valid export for {} (schema {}, exported {})",
        export.owner,
        export.schema_version,
        export.exported_at.format("%Y-%m-%d %H:%M")
    );
    println!(
        "  {} transactions, {} budgets, {} goals, {} series",
        export.metadata.transaction_count,
        export.metadata.budget_count,
        export.metadata.goal_count,
        export.metadata.series_count
    );
    Ok(())
}

fn open_output(output: Option<&PathBuf>) -> FinanceResult<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}

pub fn handle_export_command(
    storage: &Storage,
    owner: &Owner,
    cmd: ExportCommands,
) -> FinanceResult<()> {
    let output = match &cmd {
        ExportCommands::Csv { output, .. }
        | ExportCommands::Json { output, .. }
        | ExportCommands::Yaml { output } => output.clone(),
        ExportCommands::Verify { file } => return verify_export(file),
    };
    let mut writer = open_output(output.as_ref())?;

    match cmd {
        ExportCommands::Csv { table, .. } => match table {
            CsvTable::Transactions => export_transactions_csv(storage, owner, &mut writer)?,
            CsvTable::Budgets => export_budgets_csv(storage, owner, &mut writer)?,
            CsvTable::Goals => export_goals_csv(storage, owner, &mut writer)?,
        },
        ExportCommands::Json { compact, .. } => {
            export_owner_json(storage, owner, &mut writer, !compact)?;
            writeln!(writer)?;
        }
        ExportCommands::Yaml { .. } => export_owner_yaml(storage, owner, &mut writer)?,
        ExportCommands::Verify { .. } => {}
    }
    writer.flush()?;

    if let Some(path) = output {
        eprintln!("Exported to {}", path.display());
    }
    Ok(())
}
