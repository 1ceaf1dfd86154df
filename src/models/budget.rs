//! Budget model
//!
//! A budget caps spending in one category over a recurring period. Its
//! progress is never stored; it is derived from transactions on demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::history::EditRecord;
use super::ids::{BudgetId, Owner};
use super::money::Money;
use super::period::BudgetPeriod;

/// Default fraction of the cap at which a budget raises an alert
pub const DEFAULT_ALERT_THRESHOLD: f64 = 0.8;

/// Lifecycle status of a budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    #[default]
    Active,
    Paused,
    Archived,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for BudgetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" | "pause" => Ok(Self::Paused),
            "archived" | "archive" => Ok(Self::Archived),
            other => Err(format!(
                "Invalid budget status '{}': expected active, paused or archived",
                other
            )),
        }
    }
}

/// A spending cap for one category over one period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,

    pub owner: Owner,

    /// Category label matched against transaction categories
    pub category: String,

    /// The cap for one period
    pub amount: Money,

    pub period: BudgetPeriod,

    /// Fraction of the cap in (0, 1] at which an alert surfaces
    pub alert_threshold: f64,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: BudgetStatus,

    #[serde(default)]
    pub history: Vec<EditRecord>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a new active budget with the default alert threshold
    pub fn new(
        owner: Owner,
        category: impl Into<String>,
        amount: Money,
        period: BudgetPeriod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BudgetId::new(),
            owner,
            category: category.into().trim().to_string(),
            amount,
            period,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            description: String::new(),
            status: BudgetStatus::Active,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BudgetStatus::Active
    }

    /// True when `other` occupies the same (owner, category, period) slot
    pub fn conflicts_with(&self, other: &Budget) -> bool {
        self.id != other.id
            && self.owner == other.owner
            && self.period == other.period
            && self.category == other.category
    }

    pub fn record_edit(&mut self, record: EditRecord) {
        self.updated_at = record.edited_at;
        self.history.push(record);
    }

    /// Validate the budget
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.category.trim().is_empty() {
            return Err(BudgetValidationError::EmptyCategory);
        }
        if !self.amount.is_positive() {
            return Err(BudgetValidationError::NonPositiveAmount(self.amount));
        }
        validate_threshold(self.alert_threshold)?;
        Ok(())
    }
}

/// Check that an alert threshold lies in (0, 1]
pub fn validate_threshold(threshold: f64) -> Result<(), BudgetValidationError> {
    if threshold.is_finite() && threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(BudgetValidationError::InvalidThreshold(threshold))
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.category, self.period, self.amount)
    }
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetValidationError {
    EmptyCategory,
    NonPositiveAmount(Money),
    InvalidThreshold(f64),
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCategory => write!(f, "Category is required"),
            Self::NonPositiveAmount(amount) => {
                write!(f, "Budget amount must be greater than 0 (got {})", amount)
            }
            Self::InvalidThreshold(t) => {
                write!(f, "Alert threshold must be between 0 and 1 (got {})", t)
            }
        }
    }
}

impl std::error::Error for BudgetValidationError {}
