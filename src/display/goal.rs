//! Goal display formatting

use chrono::NaiveDate;

use super::report::{format_bar, format_percentage};
use super::truncate;
use crate::models::Goal;

/// Format goals as a table with progress bars
pub fn format_goal_list(goals: &[Goal], today: NaiveDate) -> String {
    if goals.is_empty() {
        return "No goals found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<15} {:<20} {:>10} {:>10} {:<10}  {}\n",
        "ID", "Name", "Saved", "Target", "Deadline", "Progress"
    ));
    output.push_str(&"-".repeat(90));
    output.push('\n');

    for goal in goals {
        let progress = goal.progress(today);
        let done = if goal.is_completed { " ✓" } else { "" };
        output.push_str(&format!(
            "{:<15} {:<20} {:>10} {:>10} {:<10}  {} {}{}\n",
            goal.id.to_string(),
            truncate(&goal.name, 20),
            goal.current_amount,
            goal.target_amount,
            goal.deadline,
            format_bar(progress.percentage, 100.0, 10),
            format_percentage(progress.percentage),
            done
        ));
    }

    output
}

pub fn format_goal_details(goal: &Goal, today: NaiveDate) -> String {
    let progress = goal.progress(today);
    let mut output = String::new();

    output.push_str(&format!("Goal:        {}\n", goal.id));
    output.push_str(&format!("Name:        {}\n", goal.name));
    output.push_str(&format!(
        "Saved:       {} of {} {}\n",
        goal.current_amount, goal.target_amount, goal.currency
    ));
    output.push_str(&format!("Remaining:   {}\n", progress.remaining));
    output.push_str(&format!(
        "Progress:    {} {}\n",
        format_bar(progress.percentage, 100.0, 20),
        format_percentage(progress.percentage)
    ));
    if progress.days_remaining >= 0 {
        output.push_str(&format!(
            "Deadline:    {} ({} days left)\n",
            goal.deadline, progress.days_remaining
        ));
    } else {
        output.push_str(&format!(
            "Deadline:    {} ({} days ago)\n",
            goal.deadline, -progress.days_remaining
        ));
    }
    output.push_str(&format!(
        "Status:      {}\n",
        if goal.is_completed { "completed" } else { "in progress" }
    ));

    if !goal.milestones.is_empty() {
        output.push_str(&format!(
            "\nMilestones ({}/{}):\n",
            progress.milestones_completed, progress.milestones_total
        ));
        for milestone in &goal.milestones {
            output.push_str(&format!("  {}\n", milestone));
        }
    }

    if !goal.notifications.is_empty() {
        output.push_str("\nNotifications:\n");
        for note in &goal.notifications {
            output.push_str(&format!("  {} {}\n", note.date.format("%Y-%m-%d"), note.message));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Milestone, Money, Owner};

    #[test]
    fn test_goal_details() {
        let day = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap();
        let mut goal = Goal::new(
            Owner::new("alice").unwrap(),
            "Laptop",
            Money::from_cents(150_000),
            day(12, 1),
            "USD",
            chrono::Utc::now(),
        );
        goal.milestones.push(Milestone::new(Money::from_cents(75_000), day(6, 1)));

        let details = format_goal_details(&goal, day(11, 21));
        assert!(details.contains("Saved:       0.00 of 1500.00 USD"));
        assert!(details.contains("(10 days left)"));
        assert!(details.contains("Milestones (0/1):"));

        assert!(format_goal_list(&[goal], day(1, 1)).contains("Laptop"));
    }
}
