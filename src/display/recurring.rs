//! Recurring series display formatting

use chrono::{DateTime, Utc};

use super::truncate;
use crate::models::{RecurringSeries, SeriesState};
use crate::services::RunReport;

pub fn format_series_list(series: &[RecurringSeries]) -> String {
    if series.is_empty() {
        return "No recurring series.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<14} {:<16} {:>10} {:<24} {:>5}  {:<10} {}\n",
        "ID", "Category", "Amount", "Rule", "Fired", "State", "Next"
    ));
    output.push_str(&"-".repeat(100));
    output.push('\n');

    for s in series {
        let next = match s.state {
            SeriesState::Scheduled => s.next_trigger.format("%Y-%m-%d").to_string(),
            _ => "-".to_string(),
        };
        output.push_str(&format!(
            "{:<14} {:<16} {:>10} {:<24} {:>5}  {:<10} {}\n",
            s.id.to_string(),
            truncate(&s.template.category, 16),
            s.template.amount,
            s.rule().to_string(),
            s.occurrences,
            s.state,
            next
        ));
        if let Some(reason) = &s.cancel_reason {
            output.push_str(&format!("{:<14} canceled: {}\n", "", reason));
        }
    }

    output
}

/// One series with its remaining trigger times, at most `limit`
pub fn format_series_details(series: &RecurringSeries, limit: usize) -> String {
    let rule = series.rule();
    let mut output = String::new();
    output.push_str(&format!("Series:      {}\n", series.id));
    output.push_str(&format!("Template:    {}\n", series.template_id));
    output.push_str(&format!(
        "Category:    {} ({})\n",
        series.template.category, series.template.kind
    ));
    output.push_str(&format!(
        "Amount:      {}\n",
        series.template.amount.format_with_code(&series.template.currency)
    ));
    output.push_str(&format!("Rule:        {}\n", rule));
    if rule.is_unbounded() {
        output.push_str("Ends:        when canceled\n");
    }
    output.push_str(&format!("Fired:       {}\n", series.occurrences));
    output.push_str(&format!("State:       {}\n", series.state));
    if let Some(reason) = &series.cancel_reason {
        output.push_str(&format!("Reason:      {}\n", reason));
    }

    let upcoming = series.upcoming(limit);
    if !upcoming.is_empty() {
        output.push_str("\nUpcoming:\n");
        output.push_str(&format_preview(&upcoming));
    }
    output
}

pub fn format_preview(triggers: &[DateTime<Utc>]) -> String {
    if triggers.is_empty() {
        return "No upcoming occurrences.\n".to_string();
    }
    triggers
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{:>3}. {}\n", i + 1, t.format("%Y-%m-%d %H:%M")))
        .collect()
}

pub fn format_run_report(report: &RunReport) -> String {
    if report.is_empty() {
        return "Nothing due.\n".to_string();
    }

    let mut output = String::new();
    for (series, txn) in &report.fired {
        output.push_str(&format!("fired     {} -> {}\n", series, txn));
    }
    for series in &report.completed {
        output.push_str(&format!("completed {}\n", series));
    }
    for (series, reason) in &report.canceled {
        output.push_str(&format!("canceled  {}: {}\n", series, reason));
    }
    for (series, error) in &report.failed {
        output.push_str(&format!("failed    {}: {}\n", series, error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Frequency, Money, Owner, RecurrenceRule, SeriesId, Transaction, TransactionKind,
    };
    use chrono::TimeZone;

    fn series(rule: &RecurrenceRule) -> RecurringSeries {
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 9, 0, 0).unwrap();
        let template = Transaction::new(
            Owner::new("alice").unwrap(),
            TransactionKind::Expense,
            "Rent",
            Money::from_cents(120_000),
            "USD",
            at,
            at,
        );
        RecurringSeries::start(&template, rule, at)
    }

    #[test]
    fn test_series_details_lists_upcoming() {
        let mut rule = RecurrenceRule::new(Frequency::Monthly);
        let details = format_series_details(&series(&rule), 2);
        assert!(details.contains("Rule:        monthly\n"));
        assert!(details.contains("Ends:        when canceled"));
        assert!(details.contains("  1. 2025-02-28 09:00\n  2. 2025-03-31 09:00\n"));

        rule.count = Some(1);
        let details = format_series_details(&series(&rule), 5);
        assert!(!details.contains("Ends:"));
        assert!(details.contains("  1. 2025-02-28 09:00\n"));
        assert!(!details.contains("  2. "));
    }

    #[test]
    fn test_preview_numbering() {
        let triggers = vec![
            Utc.with_ymd_and_hms(2025, 2, 28, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 31, 9, 0, 0).unwrap(),
        ];
        assert_eq!(
            format_preview(&triggers),
            "  1. 2025-02-28 09:00\n  2. 2025-03-31 09:00\n"
        );
        assert_eq!(format_preview(&[]), "No upcoming occurrences.\n");
    }

    #[test]
    fn test_run_report() {
        assert_eq!(format_run_report(&RunReport::default()), "Nothing due.\n");

        let mut report = RunReport::default();
        report.completed.push(SeriesId::new());
        assert!(format_run_report(&report).starts_with("completed ser-"));
    }
}
