//! Transaction model
//!
//! Represents an income or expense entry, optionally carrying recurrence
//! metadata and always carrying its own edit history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::history::EditRecord;
use super::ids::{GoalId, Owner, SeriesId, TransactionId};
use super::money::{normalize_currency, Money};
use super::recurrence::RecurrenceRule;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Ok(Self::Income),
            "expense" | "out" => Ok(Self::Expense),
            other => Err(format!(
                "Invalid transaction kind '{}': expected income or expense",
                other
            )),
        }
    }
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    pub owner: Owner,

    pub kind: TransactionKind,

    /// Free-text category label (e.g. "Food")
    pub category: String,

    /// Always positive; the direction comes from `kind`
    pub amount: Money,

    /// ISO-4217 currency code
    pub currency: String,

    pub occurred_at: DateTime<Utc>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Present when this transaction is the template of a recurring series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,

    /// Savings goal this transaction contributes to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<GoalId>,

    /// Recurring series that materialized this transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,

    #[serde(default)]
    pub tax: Money,

    /// Append-only log of edits
    #[serde(default)]
    pub history: Vec<EditRecord>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction recorded at `now`
    pub fn new(
        owner: Owner,
        kind: TransactionKind,
        category: impl Into<String>,
        amount: Money,
        currency: impl Into<String>,
        occurred_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            owner,
            kind,
            category: category.into().trim().to_string(),
            amount,
            currency: currency.into(),
            occurred_at,
            description: String::new(),
            tags: BTreeSet::new(),
            recurrence: None,
            goal_id: None,
            series_id: None,
            tax: Money::zero(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the transaction a recurring series emits at `trigger`
    ///
    /// The result copies the template's financial fields, is dated at the
    /// trigger, is itself non-recurring and has a fresh id and history.
    pub fn from_template(
        template: &Transaction,
        trigger: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, TransactionValidationError> {
        template.validate_fields()?;

        let mut txn = Self::new(
            template.owner.clone(),
            template.kind,
            template.category.clone(),
            template.amount,
            template.currency.clone(),
            trigger,
            now,
        );
        txn.description = if template.description.trim().is_empty() {
            "Recurring transaction".to_string()
        } else {
            format!("{} (Recurring)", template.description.trim())
        };
        txn.tags = template.tags.clone();
        txn.goal_id = template.goal_id;
        txn.tax = template.tax;
        Ok(txn)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    /// Amount with sign: income positive, expense negative
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Append an edit to the history and bump `updated_at`
    pub fn record_edit(&mut self, record: EditRecord) {
        self.updated_at = record.edited_at;
        self.history.push(record);
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        self.validate_fields()?;
        if let Some(rule) = &self.recurrence {
            rule.validate()
                .map_err(TransactionValidationError::InvalidRecurrence)?;
        }
        Ok(())
    }

    fn validate_fields(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount(self.amount));
        }
        if self.category.trim().is_empty() {
            return Err(TransactionValidationError::EmptyCategory);
        }
        if normalize_currency(&self.currency).as_deref() != Some(self.currency.as_str()) {
            return Err(TransactionValidationError::InvalidCurrency(
                self.currency.clone(),
            ));
        }
        if self.tax.is_negative() {
            return Err(TransactionValidationError::NegativeTax(self.tax));
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.occurred_at.format("%Y-%m-%d"),
            self.category,
            self.signed_amount(),
            self.currency
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount(Money),
    EmptyCategory,
    InvalidCurrency(String),
    NegativeTax(Money),
    InvalidRecurrence(String),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than 0 (got {})", amount)
            }
            Self::EmptyCategory => write!(f, "Category is required"),
            Self::InvalidCurrency(code) => {
                write!(f, "Invalid currency code '{}': expected e.g. USD", code)
            }
            Self::NegativeTax(tax) => write!(f, "Tax cannot be negative (got {})", tax),
            Self::InvalidRecurrence(msg) => write!(f, "Invalid recurrence: {}", msg),
        }
    }
}

impl std::error::Error for TransactionValidationError {}
