//! Budget period representation
//!
//! A budget is measured over the *current* cycle of its period: today, this
//! week, this month or this year, always ending at "now".

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The cycle a budget cap applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn all() -> [BudgetPeriod; 4] {
        [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// First day of the cycle containing `today`
    pub fn start_date(&self, today: NaiveDate, week_start: Weekday) -> NaiveDate {
        match self {
            Self::Daily => today,
            Self::Weekly => {
                let offset = (7 + today.weekday().num_days_from_monday()
                    - week_start.num_days_from_monday())
                    % 7;
                today - Duration::days(offset as i64)
            }
            Self::Monthly => today.with_day(1).unwrap_or(today),
            Self::Yearly => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        }
    }

    /// The current window `[start of cycle, now]`
    pub fn current_window(&self, now: DateTime<Utc>, week_start: Weekday) -> PeriodWindow {
        let start_day = self.start_date(now.date_naive(), week_start);
        PeriodWindow {
            start: Utc.from_utc_datetime(&start_day.and_time(NaiveTime::MIN)),
            end: now,
        }
    }

    /// Total number of days in the cycle containing `today`
    pub fn days_in_period(&self, today: NaiveDate) -> u32 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => days_in_month(today.year(), today.month()),
            Self::Yearly => {
                if NaiveDate::from_ymd_opt(today.year(), 2, 29).is_some() {
                    366
                } else {
                    365
                }
            }
        }
    }

    /// Days of the cycle elapsed so far, counting today
    pub fn days_elapsed(&self, today: NaiveDate, week_start: Weekday) -> u32 {
        let start = self.start_date(today, week_start);
        (today - start).num_days() as u32 + 1
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            "yearly" | "year" | "annual" => Ok(Self::Yearly),
            other => Err(PeriodParseError(other.to_string())),
        }
    }
}

/// Number of days in a calendar month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (next, NaiveDate::from_ymd_opt(year, month, 1)) {
        (Some(next), Some(first)) => (next - first).num_days() as u32,
        _ => 30,
    }
}

/// Inclusive time range a budget's spend is measured over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PeriodWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodParseError(pub String);

impl fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid period '{}': expected daily, weekly, monthly or yearly",
            self.0
        )
    }
}

impl std::error::Error for PeriodParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    #[test]
    fn test_daily_window_starts_at_midnight() {
        let now = at(2025, 3, 12, 15);
        let window = BudgetPeriod::Daily.current_window(now, Weekday::Sun);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 12, 0, 0, 0).unwrap());
        assert_eq!(window.end, now);
    }

    #[test]
    fn test_weekly_window_respects_week_start() {
        // 2025-03-12 is a Wednesday
        let now = at(2025, 3, 12, 15);
        let sunday = BudgetPeriod::Weekly.current_window(now, Weekday::Sun);
        assert_eq!(sunday.start.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());

        let monday = BudgetPeriod::Weekly.current_window(now, Weekday::Mon);
        assert_eq!(monday.start.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }

    #[test]
    fn test_weekly_window_on_week_start_day_is_today() {
        // 2025-03-09 is a Sunday
        let now = at(2025, 3, 9, 8);
        let window = BudgetPeriod::Weekly.current_window(now, Weekday::Sun);
        assert_eq!(window.start.date_naive(), now.date_naive());
    }

    #[test]
    fn test_monthly_and_yearly_windows() {
        let now = at(2025, 3, 12, 15);
        let monthly = BudgetPeriod::Monthly.current_window(now, Weekday::Sun);
        assert_eq!(monthly.start.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        let yearly = BudgetPeriod::Yearly.current_window(now, Weekday::Sun);
        assert_eq!(yearly.start.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_window_excludes_future() {
        let now = at(2025, 3, 12, 15);
        let window = BudgetPeriod::Monthly.current_window(now, Weekday::Sun);
        assert!(window.contains(at(2025, 3, 1, 0)));
        assert!(!window.contains(at(2025, 3, 20, 0)));
        assert!(!window.contains(at(2025, 2, 28, 23)));
    }

    #[test]
    fn test_days_in_period() {
        let feb_leap = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(BudgetPeriod::Monthly.days_in_period(feb_leap), 29);
        assert_eq!(BudgetPeriod::Yearly.days_in_period(feb_leap), 366);
        assert_eq!(BudgetPeriod::Weekly.days_in_period(feb_leap), 7);
        assert_eq!(
            BudgetPeriod::Monthly.days_elapsed(feb_leap, Weekday::Sun),
            10
        );
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Monthly".parse::<BudgetPeriod>().unwrap(), BudgetPeriod::Monthly);
        assert_eq!("week".parse::<BudgetPeriod>().unwrap(), BudgetPeriod::Weekly);
        assert!("fortnightly".parse::<BudgetPeriod>().is_err());
        assert_eq!(BudgetPeriod::Yearly.to_string(), "yearly");
    }
}
