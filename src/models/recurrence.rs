//! Recurrence rules and the recurring series state machine
//!
//! A series is one timeline of derived transactions. Trigger `n` is always
//! computed from the template date as `template + n * cadence`, so a monthly
//! series anchored on the 31st lands on the last day of shorter months and
//! comes back to the 31st afterwards.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{Owner, SeriesId, TransactionId};
use super::transaction::Transaction;

/// How often a recurring transaction repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// The `n`th trigger after `base`, or `None` if it is not representable
    pub fn trigger_at(&self, base: DateTime<Utc>, n: u32) -> Option<DateTime<Utc>> {
        match self {
            Self::Daily => base.checked_add_signed(Duration::days(n as i64)),
            Self::Weekly => base.checked_add_signed(Duration::weeks(n as i64)),
            Self::Monthly => base.checked_add_months(Months::new(n)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(format!(
                "Invalid frequency '{}': expected daily, weekly or monthly",
                other
            )),
        }
    }
}

/// Recurrence metadata attached to a template transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,

    /// Last instant a trigger may fire at (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    /// Maximum number of derived transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            end_date: None,
            count: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.count == Some(0) {
            return Err("occurrence count must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn is_unbounded(&self) -> bool {
        self.end_date.is_none() && self.count.is_none()
    }

    /// Upcoming trigger times after `base`, at most `limit` of them
    pub fn upcoming(&self, base: DateTime<Utc>, limit: usize) -> Vec<DateTime<Utc>> {
        let max = self.count.map(|c| c as usize).unwrap_or(usize::MAX).min(limit);
        (1..)
            .map_while(|n| self.frequency.trigger_at(base, n))
            .take_while(|at| self.end_date.map_or(true, |end| *at <= end))
            .take(max)
            .collect()
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frequency)?;
        if let Some(count) = self.count {
            write!(f, " x{}", count)?;
        }
        if let Some(end) = self.end_date {
            write!(f, " until {}", end.format("%Y-%m-%d"))?;
        }
        Ok(())
    }
}

/// Resting state of a series
///
/// Firing is an outcome of [`RecurringSeries::fire`], not a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesState {
    Scheduled,
    Completed,
    Canceled,
}

impl SeriesState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Scheduled)
    }
}

impl fmt::Display for SeriesState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Completed => write!(f, "completed"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// What happened when a series was asked to fire
#[derive(Debug, Clone)]
pub enum FireOutcome {
    /// A transaction was materialized and the series advanced
    Fired(Transaction),
    /// A stop condition was hit before firing
    Completed,
    /// The template failed validation
    Canceled(String),
    /// The series was already terminal
    Idle,
}

/// One row of the recurring job table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSeries {
    pub id: SeriesId,

    pub owner: Owner,

    /// Id of the transaction the series was started from
    pub template_id: TransactionId,

    /// Snapshot of the template at start time
    pub template: Transaction,

    pub frequency: Frequency,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurrences: Option<u32>,

    /// Number of transactions materialized so far
    pub occurrences: u32,

    /// When the series fires next; meaningless once terminal
    pub next_trigger: DateTime<Utc>,

    pub state: SeriesState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl RecurringSeries {
    /// Start a series from a template
    ///
    /// The first trigger is one cadence unit after the template date. A series
    /// whose first trigger already lies past its end date starts `Completed`.
    pub fn start(template: &Transaction, rule: &RecurrenceRule, now: DateTime<Utc>) -> Self {
        let mut snapshot = template.clone();
        snapshot.recurrence = None;
        snapshot.history.clear();

        let first = rule.frequency.trigger_at(template.occurred_at, 1);
        let mut series = Self {
            id: SeriesId::new(),
            owner: template.owner.clone(),
            template_id: template.id,
            template: snapshot,
            frequency: rule.frequency,
            end_date: rule.end_date,
            max_occurrences: rule.count,
            occurrences: 0,
            next_trigger: first.unwrap_or(template.occurred_at),
            state: SeriesState::Scheduled,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        };
        if first.is_none() || series.should_stop() {
            series.state = SeriesState::Completed;
        }
        series
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Scheduled and due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == SeriesState::Scheduled && self.next_trigger <= now
    }

    pub fn rule(&self) -> RecurrenceRule {
        RecurrenceRule {
            frequency: self.frequency,
            end_date: self.end_date,
            count: self.max_occurrences,
        }
    }

    /// Remaining trigger times, at most `limit`
    pub fn upcoming(&self, limit: usize) -> Vec<DateTime<Utc>> {
        if self.is_terminal() {
            return Vec::new();
        }
        let remaining = self
            .max_occurrences
            .map(|max| max.saturating_sub(self.occurrences) as usize)
            .unwrap_or(usize::MAX);
        (self.occurrences + 1..)
            .map_while(|n| self.frequency.trigger_at(self.template.occurred_at, n))
            .take_while(|at| self.end_date.map_or(true, |end| *at <= end))
            .take(remaining.min(limit))
            .collect()
    }

    fn should_stop(&self) -> bool {
        if let Some(end) = self.end_date {
            if self.next_trigger > end {
                return true;
            }
        }
        if let Some(max) = self.max_occurrences {
            if self.occurrences >= max {
                return true;
            }
        }
        false
    }

    /// Fire the pending trigger
    ///
    /// Stop conditions are checked first. On success the counter and the
    /// next trigger advance and the stop conditions are re-evaluated, so a
    /// series that just produced its last transaction is already `Completed`.
    pub fn fire(&mut self, now: DateTime<Utc>) -> FireOutcome {
        if self.is_terminal() {
            return FireOutcome::Idle;
        }
        if self.should_stop() {
            self.state = SeriesState::Completed;
            self.updated_at = now;
            return FireOutcome::Completed;
        }

        let mut txn = match Transaction::from_template(&self.template, self.next_trigger, now) {
            Ok(txn) => txn,
            Err(e) => {
                let reason = e.to_string();
                self.cancel(reason.clone(), now);
                return FireOutcome::Canceled(reason);
            }
        };

        txn.series_id = Some(self.id);
        self.occurrences += 1;
        self.updated_at = now;
        match self
            .frequency
            .trigger_at(self.template.occurred_at, self.occurrences + 1)
        {
            Some(next) => {
                self.next_trigger = next;
                if self.should_stop() {
                    self.state = SeriesState::Completed;
                }
            }
            None => self.state = SeriesState::Completed,
        }
        FireOutcome::Fired(txn)
    }

    /// Move a non-terminal series to `Canceled`; terminal series are left as is
    pub fn cancel(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = SeriesState::Canceled;
        self.cancel_reason = Some(reason.into());
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::money::Money;
    use crate::models::transaction::TransactionKind;
    use chrono::{NaiveDate, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn template_at(when: DateTime<Utc>) -> Transaction {
        let mut txn = Transaction::new(
            Owner::new("alice").unwrap(),
            TransactionKind::Expense,
            "Rent",
            Money::from_cents(120_000),
            "USD",
            when,
            when,
        );
        txn.description = "Apartment".into();
        txn
    }

    fn rule(frequency: Frequency, end: Option<DateTime<Utc>>, count: Option<u32>) -> RecurrenceRule {
        RecurrenceRule {
            frequency,
            end_date: end,
            count,
        }
    }

    fn drain(series: &mut RecurringSeries, now: DateTime<Utc>) -> Vec<Transaction> {
        let mut out = Vec::new();
        while series.is_due(now) {
            match series.fire(now) {
                FireOutcome::Fired(txn) => out.push(txn),
                _ => break,
            }
        }
        out
    }

    #[test]
    fn test_daily_count_three_then_completed() {
        let start = at(2025, 1, 1);
        let mut series = RecurringSeries::start(
            &template_at(start),
            &rule(Frequency::Daily, None, Some(3)),
            start,
        );
        assert_eq!(series.state, SeriesState::Scheduled);
        assert_eq!(series.next_trigger, at(2025, 1, 2));

        let fired = drain(&mut series, at(2025, 2, 1));
        let dates: Vec<_> = fired.iter().map(|t| t.occurred_at).collect();
        assert_eq!(dates, vec![at(2025, 1, 2), at(2025, 1, 3), at(2025, 1, 4)]);
        assert_eq!(series.occurrences, 3);
        assert_eq!(series.state, SeriesState::Completed);
        assert!(fired.iter().all(|t| !t.is_recurring()));
        assert!(fired.iter().all(|t| t.description == "Apartment (Recurring)"));
        assert!(fired.iter().all(|t| t.series_id == Some(series.id)));
        assert!(fired.iter().all(|t| t.created_at == at(2025, 2, 1)));
    }

    #[test]
    fn test_end_date_before_first_trigger_completes_immediately() {
        let start = at(2025, 1, 1);
        let series = RecurringSeries::start(
            &template_at(start),
            &rule(Frequency::Weekly, Some(at(2025, 1, 5)), None),
            start,
        );
        assert_eq!(series.state, SeriesState::Completed);
        assert_eq!(series.occurrences, 0);
        assert!(series.upcoming(10).is_empty());
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let start = at(2025, 1, 1);
        let mut series = RecurringSeries::start(
            &template_at(start),
            &rule(Frequency::Daily, Some(at(2025, 1, 3)), None),
            start,
        );
        let fired = drain(&mut series, at(2025, 3, 1));
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[1].occurred_at, at(2025, 1, 3));
        assert_eq!(series.state, SeriesState::Completed);
    }

    #[test]
    fn test_monthly_clamps_to_last_day_and_keeps_anchor() {
        let start = at(2025, 1, 31);
        let mut series = RecurringSeries::start(
            &template_at(start),
            &rule(Frequency::Monthly, None, Some(3)),
            start,
        );
        let fired = drain(&mut series, at(2025, 12, 31));
        let days: Vec<_> = fired.iter().map(|t| t.occurred_at.date_naive()).collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
                NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
            ]
        );
    }

    #[test]
    fn test_monthly_clamps_to_leap_day() {
        let triggers = rule(Frequency::Monthly, None, Some(2)).upcoming(at(2024, 1, 31), 10);
        assert_eq!(triggers[0].date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(triggers[1].date_naive(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn test_unbounded_series_only_fires_due_triggers() {
        let start = at(2025, 1, 1);
        let mut series = RecurringSeries::start(
            &template_at(start),
            &rule(Frequency::Weekly, None, None),
            start,
        );
        let fired = drain(&mut series, at(2025, 1, 20));
        assert_eq!(fired.len(), 2);
        assert_eq!(series.state, SeriesState::Scheduled);
        assert_eq!(series.next_trigger, at(2025, 1, 22));
    }

    #[test]
    fn test_invalid_template_cancels_series() {
        let start = at(2025, 1, 1);
        let mut template = template_at(start);
        template.amount = Money::zero();
        let mut series =
            RecurringSeries::start(&template, &rule(Frequency::Daily, None, None), start);

        match series.fire(at(2025, 1, 2)) {
            FireOutcome::Canceled(reason) => assert!(reason.contains("Amount")),
            other => panic!("expected cancellation, got {:?}", other),
        }
        assert_eq!(series.state, SeriesState::Canceled);
        assert!(series.cancel_reason.is_some());
        assert!(matches!(series.fire(at(2025, 1, 3)), FireOutcome::Idle));
    }

    #[test]
    fn test_cancel_is_noop_on_terminal() {
        let start = at(2025, 1, 1);
        let mut series = RecurringSeries::start(
            &template_at(start),
            &rule(Frequency::Daily, None, None),
            start,
        );
        assert!(series.cancel("user request", start));
        assert!(!series.cancel("again", start));
        assert_eq!(series.cancel_reason.as_deref(), Some("user request"));
        assert!(matches!(series.fire(at(2025, 2, 1)), FireOutcome::Idle));
    }

    #[test]
    fn test_upcoming_respects_progress() {
        let start = at(2025, 1, 1);
        let mut series = RecurringSeries::start(
            &template_at(start),
            &rule(Frequency::Daily, None, Some(5)),
            start,
        );
        drain(&mut series, at(2025, 1, 3));
        let upcoming = series.upcoming(10);
        assert_eq!(upcoming, vec![at(2025, 1, 4), at(2025, 1, 5), at(2025, 1, 6)]);
    }

    #[test]
    fn test_rule_validation_and_parse() {
        assert!(rule(Frequency::Daily, None, Some(0)).validate().is_err());
        assert!(rule(Frequency::Daily, None, Some(1)).validate().is_ok());
        assert_eq!("Weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert!("yearly".parse::<Frequency>().is_err());
        assert_eq!(
            rule(Frequency::Monthly, Some(at(2025, 6, 1)), Some(4)).to_string(),
            "monthly x4 until 2025-06-01"
        );
    }
}
