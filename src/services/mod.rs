//! Service layer for FinTrack
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, edit history, auditing and cross-entity operations.
//! The period accounting engine in [`accounting`] is pure and works on
//! whatever budgets and transactions it is handed.

pub mod accounting;
pub mod budget;
pub mod goal;
pub mod prediction;
pub mod recurring;
pub mod transaction;

pub use accounting::{
    aggregate_across_budgets, check_alerts, compute_progress, AlertNotice, AlertSeverity,
    BudgetAlert, BudgetProgress, BudgetSummary,
};
pub use budget::{BudgetAnalytics, BudgetPatch, BudgetService, CreateBudgetInput};
pub use goal::{AmountUpdate, CreateGoalInput, GoalPatch, GoalService};
pub use prediction::{Prediction, PredictionService, PredictionSource};
pub use recurring::{RecurringService, RunReport};
pub use transaction::{
    CreateTransactionInput, TransactionFilter, TransactionPatch, TransactionService,
};
