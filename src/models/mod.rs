//! Core data models for FinTrack
//!
//! This module contains the data structures of the finance domain:
//! transactions, budgets, savings goals, recurring series and the learned
//! category predictions.

pub mod budget;
pub mod goal;
pub mod history;
pub mod ids;
pub mod money;
pub mod period;
pub mod prediction;
pub mod recurrence;
pub mod transaction;

pub use budget::{Budget, BudgetStatus, BudgetValidationError, DEFAULT_ALERT_THRESHOLD};
pub use goal::{
    AmountOperation, Goal, GoalProgress, GoalValidationError, Milestone, ProgressNotification,
};
pub use history::{ChangeSet, EditRecord, FieldChange};
pub use ids::{BudgetId, GoalId, Owner, SeriesId, TransactionId};
pub use money::{normalize_currency, Money, MoneyParseError};
pub use period::{BudgetPeriod, PeriodWindow};
pub use prediction::CategoryPrediction;
pub use recurrence::{FireOutcome, Frequency, RecurrenceRule, RecurringSeries, SeriesState};
pub use transaction::{Transaction, TransactionKind, TransactionValidationError};
