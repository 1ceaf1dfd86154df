use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};

use fintrack::cli::{
    handle_audit_command, handle_budget_command, handle_category_command, handle_export_command,
    handle_goal_command, handle_recurring_command, handle_report_command,
    handle_transaction_command,
};
use fintrack::config::{paths::FinTrackPaths, settings::Settings};
use fintrack::logging::init_tracing;
use fintrack::models::{normalize_currency, Owner};
use fintrack::storage::Storage;

#[derive(Parser)]
#[command(
    name = "fintrack",
    version,
    about = "Personal finance tracker",
    long_about = "FinTrack records income and expenses, tracks budgets per period, \
                  follows savings goals and generates recurring transactions."
)]
struct Cli {
    /// User whose data is read and written
    #[arg(short, long, global = true, env = "FINTRACK_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and settings file
    Init {
        /// Default user for later commands
        #[arg(long)]
        default_user: Option<String>,
        /// Default currency code
        #[arg(long)]
        currency: Option<String>,
    },

    /// Show current configuration and paths
    Config,

    /// Transaction management commands
    #[command(subcommand, alias = "txn")]
    Transaction(fintrack::cli::TransactionCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(fintrack::cli::BudgetCommands),

    /// Savings goal commands
    #[command(subcommand)]
    Goal(fintrack::cli::GoalCommands),

    /// Recurring series commands
    #[command(subcommand)]
    Recurring(fintrack::cli::RecurringCommands),

    /// Reports and analytics
    #[command(subcommand)]
    Report(fintrack::cli::ReportCommands),

    /// Category prediction commands
    #[command(subcommand)]
    Category(fintrack::cli::CategoryCommands),

    /// Export data
    #[command(subcommand)]
    Export(fintrack::cli::ExportCommands),

    /// Show the audit log
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn resolve_owner(flag: Option<&str>, settings: &Settings) -> Result<Owner> {
    let name = flag.or(settings.default_user.as_deref());
    match name.and_then(Owner::new) {
        Some(owner) => Ok(owner),
        None => bail!(
            "No user given. Pass --user, set FINTRACK_USER, or run 'fintrack init --default-user NAME'"
        ),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = FinTrackPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    let command = match cli.command {
        Some(Commands::Init {
            default_user,
            currency,
        }) => {
            println!("Initializing FinTrack at: {}", paths.base_dir().display());
            if let Some(user) = default_user {
                settings.default_user = Owner::new(&user).map(|o| o.to_string());
            }
            if let Some(code) = currency {
                settings.default_currency = normalize_currency(&code)
                    .ok_or_else(|| anyhow!("Invalid currency code '{}'", code))?;
            }
            Storage::new(paths.clone())?.save_all()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            return Ok(());
        }
        Some(Commands::Config) => {
            println!("FinTrack Configuration");
            println!("======================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Default currency: {}", settings.default_currency);
            println!("  Week starts on:   {:?}", settings.week_start.weekday());
            println!("  Alert threshold:  {}", settings.default_alert_threshold);
            println!(
                "  Default user:     {}",
                settings.default_user.as_deref().unwrap_or("(none)")
            );
            return Ok(());
        }
        Some(command) => command,
        None => {
            println!("FinTrack - personal finance tracker");
            println!();
            println!("Run 'fintrack --help' for usage information.");
            return Ok(());
        }
    };

    let owner = resolve_owner(cli.user.as_deref(), &settings)?;
    let storage = Storage::open(paths)?;

    match command {
        Commands::Transaction(cmd) => handle_transaction_command(&storage, &settings, &owner, cmd)?,
        Commands::Budget(cmd) => handle_budget_command(&storage, &settings, &owner, cmd)?,
        Commands::Goal(cmd) => handle_goal_command(&storage, &settings, &owner, cmd)?,
        Commands::Recurring(cmd) => handle_recurring_command(&storage, &owner, cmd)?,
        Commands::Report(cmd) => handle_report_command(&storage, &settings, &owner, cmd)?,
        Commands::Category(cmd) => handle_category_command(&storage, &owner, cmd)?,
        Commands::Export(cmd) => handle_export_command(&storage, &owner, cmd)?,
        Commands::Audit { limit } => handle_audit_command(&storage, &owner, limit)?,
        Commands::Init { .. } | Commands::Config => {}
    }

    Ok(())
}
