//! Append-only edit history carried by editable entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One field changed by an edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub from: String,
    pub to: String,
}

impl FieldChange {
    pub fn new(field: &str, from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self {
            field: field.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.from, self.to)
    }
}

/// A single edit: when it happened and what it changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRecord {
    pub edited_at: DateTime<Utc>,
    pub changes: Vec<FieldChange>,
}

impl EditRecord {
    pub fn summary(&self) -> String {
        self.changes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Collects field changes while a patch is applied
#[derive(Debug, Default)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change when `from != to`
    pub fn track<T: PartialEq + fmt::Display>(&mut self, field: &str, from: &T, to: &T) {
        if from != to {
            self.changes.push(FieldChange::new(field, from, to));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Close the set into a history record, or `None` if nothing changed
    pub fn into_record(self, edited_at: DateTime<Utc>) -> Option<EditRecord> {
        if self.changes.is_empty() {
            None
        } else {
            Some(EditRecord {
                edited_at,
                changes: self.changes,
            })
        }
    }
}
