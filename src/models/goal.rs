//! Savings goal model
//!
//! A goal tracks saved money toward a target by a deadline, with optional
//! intermediate milestones.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::history::EditRecord;
use super::ids::{GoalId, Owner};
use super::money::Money;

/// Maximum length of a goal name
pub const MAX_GOAL_NAME_LEN: usize = 100;

/// An intermediate target inside a goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub amount: Money,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_completed: bool,
}

impl Milestone {
    pub fn new(amount: Money, date: NaiveDate) -> Self {
        Self {
            amount,
            date,
            is_completed: false,
        }
    }

    /// Parse the CLI form `AMOUNT@YYYY-MM-DD`
    pub fn parse(s: &str) -> Result<Self, String> {
        let (amount, date) = s
            .split_once('@')
            .ok_or_else(|| format!("Invalid milestone '{}': expected AMOUNT@YYYY-MM-DD", s))?;
        let amount = Money::parse(amount).map_err(|e| e.to_string())?;
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| format!("Invalid milestone date '{}': {}", date, e))?;
        Ok(Self::new(amount, date))
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.is_completed { "x" } else { " " };
        write!(f, "[{}] {} by {}", mark, self.amount, self.date)
    }
}

/// A message recorded when a goal crosses a milestone or completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressNotification {
    pub date: DateTime<Utc>,
    pub message: String,
}

/// How a goal amount update combines with the current amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountOperation {
    Add,
    Subtract,
    Set,
}

impl AmountOperation {
    /// Apply to `current`, never going below zero
    pub fn apply(&self, current: Money, amount: Money) -> Money {
        let next = match self {
            Self::Add => current + amount,
            Self::Subtract => current - amount,
            Self::Set => amount,
        };
        next.max_zero()
    }
}

impl FromStr for AmountOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "subtract" | "sub" => Ok(Self::Subtract),
            "set" => Ok(Self::Set),
            other => Err(format!(
                "Invalid operation '{}': expected add, subtract or set",
                other
            )),
        }
    }
}

impl fmt::Display for AmountOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Subtract => write!(f, "subtract"),
            Self::Set => write!(f, "set"),
        }
    }
}

/// A savings goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,

    pub owner: Owner,

    pub name: String,

    pub target_amount: Money,

    #[serde(default)]
    pub current_amount: Money,

    pub deadline: NaiveDate,

    pub currency: String,

    #[serde(default)]
    pub milestones: Vec<Milestone>,

    #[serde(default)]
    pub notifications: Vec<ProgressNotification>,

    #[serde(default)]
    pub is_completed: bool,

    #[serde(default)]
    pub history: Vec<EditRecord>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(
        owner: Owner,
        name: impl Into<String>,
        target_amount: Money,
        deadline: NaiveDate,
        currency: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: GoalId::new(),
            owner,
            name: name.into().trim().to_string(),
            target_amount,
            current_amount: Money::zero(),
            deadline,
            currency: currency.into(),
            milestones: Vec::new(),
            notifications: Vec::new(),
            is_completed: false,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True when `other` has the same owner, name, target and deadline
    pub fn conflicts_with(&self, other: &Goal) -> bool {
        self.id != other.id
            && self.owner == other.owner
            && self.name == other.name
            && self.target_amount == other.target_amount
            && self.deadline == other.deadline
    }

    /// Validate the structural invariants (everything except the deadline
    /// being in the future, which depends on the clock)
    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.name.trim().is_empty() {
            return Err(GoalValidationError::EmptyName);
        }
        if self.name.chars().count() > MAX_GOAL_NAME_LEN {
            return Err(GoalValidationError::NameTooLong(self.name.chars().count()));
        }
        if !self.target_amount.is_positive() {
            return Err(GoalValidationError::NonPositiveTarget(self.target_amount));
        }
        if self.current_amount.is_negative() {
            return Err(GoalValidationError::NegativeCurrent(self.current_amount));
        }
        for milestone in &self.milestones {
            if milestone.amount.is_negative() || milestone.amount > self.target_amount {
                return Err(GoalValidationError::MilestoneExceedsTarget {
                    milestone: milestone.amount,
                    target: self.target_amount,
                });
            }
            if milestone.date > self.deadline {
                return Err(GoalValidationError::MilestoneAfterDeadline {
                    milestone: milestone.date,
                    deadline: self.deadline,
                });
            }
        }
        Ok(())
    }

    /// Check that the deadline lies strictly after `today`
    pub fn validate_deadline(&self, today: NaiveDate) -> Result<(), GoalValidationError> {
        if self.deadline <= today {
            return Err(GoalValidationError::DeadlineNotInFuture(self.deadline));
        }
        Ok(())
    }

    /// Change the saved amount and mark any milestones it reaches
    ///
    /// Returns the milestones that were newly completed. The goal completes
    /// itself once the target is reached.
    pub fn apply_amount(
        &mut self,
        operation: AmountOperation,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Vec<Milestone> {
        self.current_amount = operation.apply(self.current_amount, amount);
        self.updated_at = now;

        let mut reached = Vec::new();
        for milestone in self.milestones.iter_mut() {
            if !milestone.is_completed && self.current_amount >= milestone.amount {
                milestone.is_completed = true;
                reached.push(milestone.clone());
            }
        }
        for milestone in &reached {
            self.notifications.push(ProgressNotification {
                date: now,
                message: format!("Milestone of {} {} reached", milestone.amount, self.currency),
            });
        }

        if !self.is_completed && self.current_amount >= self.target_amount {
            self.is_completed = true;
            self.notifications.push(ProgressNotification {
                date: now,
                message: format!("Goal '{}' completed", self.name),
            });
        }
        reached
    }

    pub fn record_edit(&mut self, record: EditRecord) {
        self.updated_at = record.edited_at;
        self.history.push(record);
    }

    pub fn progress(&self, today: NaiveDate) -> GoalProgress {
        let percentage = (self.current_amount.ratio_of(self.target_amount) * 100.0).min(100.0);
        GoalProgress {
            percentage,
            remaining: (self.target_amount - self.current_amount).max_zero(),
            days_remaining: (self.deadline - today).num_days(),
            milestones_completed: self.milestones.iter().filter(|m| m.is_completed).count(),
            milestones_total: self.milestones.len(),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} / {} {})",
            self.name, self.current_amount, self.target_amount, self.currency
        )
    }
}

/// Derived progress of a goal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    /// Saved fraction of the target in percent, capped at 100
    pub percentage: f64,
    pub remaining: Money,
    /// Negative once the deadline has passed
    pub days_remaining: i64,
    pub milestones_completed: usize,
    pub milestones_total: usize,
}

/// Validation errors for goals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    EmptyName,
    NameTooLong(usize),
    NonPositiveTarget(Money),
    NegativeCurrent(Money),
    DeadlineNotInFuture(NaiveDate),
    MilestoneExceedsTarget { milestone: Money, target: Money },
    MilestoneAfterDeadline { milestone: NaiveDate, deadline: NaiveDate },
}

impl fmt::Display for GoalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Goal name is required"),
            Self::NameTooLong(len) => write!(
                f,
                "Goal name is too long ({} chars, max {})",
                len, MAX_GOAL_NAME_LEN
            ),
            Self::NonPositiveTarget(amount) => {
                write!(f, "Target amount must be positive (got {})", amount)
            }
            Self::NegativeCurrent(amount) => {
                write!(f, "Current amount cannot be negative (got {})", amount)
            }
            Self::DeadlineNotInFuture(date) => {
                write!(f, "Deadline must be in the future (got {})", date)
            }
            Self::MilestoneExceedsTarget { milestone, target } => write!(
                f,
                "Milestone amount cannot exceed target amount ({} > {})",
                milestone, target
            ),
            Self::MilestoneAfterDeadline { milestone, deadline } => write!(
                f,
                "Milestone date cannot be after deadline ({} > {})",
                milestone, deadline
            ),
        }
    }
}

impl std::error::Error for GoalValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(target_cents: i64) -> Goal {
        Goal::new(
            Owner::new("alice").unwrap(),
            "  Vacation ",
            Money::from_cents(target_cents),
            day(2030, 6, 1),
            "USD",
            Utc::now(),
        )
    }

    #[test]
    fn test_new_goal_trims_name() {
        let g = goal(100_000);
        assert_eq!(g.name, "Vacation");
        assert!(g.validate().is_ok());
        assert!(g.validate_deadline(day(2025, 1, 1)).is_ok());
        assert!(g.validate_deadline(day(2030, 6, 1)).is_err());
    }

    #[test]
    fn test_milestone_above_target_is_rejected() {
        let mut g = goal(100_000);
        g.milestones.push(Milestone::new(Money::from_cents(120_000), day(2029, 1, 1)));
        assert!(matches!(
            g.validate(),
            Err(GoalValidationError::MilestoneExceedsTarget { .. })
        ));
    }

    #[test]
    fn test_milestone_after_deadline_is_rejected() {
        let mut g = goal(100_000);
        g.milestones.push(Milestone::new(Money::from_cents(50_000), day(2031, 1, 1)));
        assert!(matches!(
            g.validate(),
            Err(GoalValidationError::MilestoneAfterDeadline { .. })
        ));
    }

    #[test]
    fn test_name_length_limit() {
        let mut g = goal(100);
        g.name = "x".repeat(MAX_GOAL_NAME_LEN + 1);
        assert!(matches!(g.validate(), Err(GoalValidationError::NameTooLong(_))));
    }

    #[test]
    fn test_amount_operations_clamp_at_zero() {
        let current = Money::from_cents(500);
        let amount = Money::from_cents(800);
        assert_eq!(AmountOperation::Add.apply(current, amount).cents(), 1300);
        assert_eq!(AmountOperation::Subtract.apply(current, amount), Money::zero());
        assert_eq!(AmountOperation::Set.apply(current, amount).cents(), 800);
        assert_eq!(AmountOperation::Set.apply(current, -amount), Money::zero());
    }

    #[test]
    fn test_apply_amount_completes_milestones_and_goal() {
        let mut g = goal(100_000);
        g.milestones.push(Milestone::new(Money::from_cents(25_000), day(2028, 1, 1)));
        g.milestones.push(Milestone::new(Money::from_cents(50_000), day(2029, 1, 1)));
        let now = Utc::now();

        let reached = g.apply_amount(AmountOperation::Add, Money::from_cents(30_000), now);
        assert_eq!(reached.len(), 1);
        assert!(g.milestones[0].is_completed);
        assert!(!g.milestones[1].is_completed);
        assert!(!g.is_completed);

        let reached = g.apply_amount(AmountOperation::Set, Money::from_cents(100_000), now);
        assert_eq!(reached.len(), 1);
        assert!(g.is_completed);
        assert_eq!(g.notifications.len(), 3);
    }

    #[test]
    fn test_progress() {
        let mut g = goal(100_000);
        g.current_amount = Money::from_cents(25_000);
        let p = g.progress(day(2030, 5, 22));
        assert!((p.percentage - 25.0).abs() < 1e-9);
        assert_eq!(p.remaining.cents(), 75_000);
        assert_eq!(p.days_remaining, 10);

        g.current_amount = Money::from_cents(150_000);
        let p = g.progress(day(2030, 5, 22));
        assert_eq!(p.percentage, 100.0);
        assert_eq!(p.remaining, Money::zero());
    }

    #[test]
    fn test_conflicts_with() {
        let a = goal(100_000);
        let mut b = goal(100_000);
        assert!(a.conflicts_with(&b));
        b.target_amount = Money::from_cents(90_000);
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn test_milestone_parse() {
        let m = Milestone::parse("250.00@2029-03-01").unwrap();
        assert_eq!(m.amount.cents(), 25_000);
        assert_eq!(m.date, day(2029, 3, 1));
        assert!(Milestone::parse("250").is_err());
        assert!(Milestone::parse("250@tomorrow").is_err());
    }
}
