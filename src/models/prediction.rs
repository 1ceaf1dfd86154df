//! Learned description-to-category mappings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::Owner;

/// Keyword hints consulted in order when nothing has been learned
pub const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("coffee", "Food"),
    ("lunch", "Food"),
    ("uber", "Transportation"),
    ("rent", "Housing"),
    ("electricity", "Utilities"),
    ("movie", "Entertainment"),
    ("doctor", "Healthcare"),
];

/// Fallback category when no hint applies
pub const FALLBACK_CATEGORY: &str = "Other";

/// How many times a mapping must be seen before it beats the keyword hints
pub const LEARNED_MIN_FREQUENCY: u32 = 2;

/// One learned mapping for an owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPrediction {
    pub owner: Owner,

    /// Lower-cased, trimmed description
    pub description: String,

    pub category: String,

    /// Number of times this description was categorized
    pub frequency: u32,

    pub updated_at: DateTime<Utc>,
}

impl CategoryPrediction {
    pub fn new(owner: Owner, description: &str, category: impl Into<String>) -> Self {
        Self {
            owner,
            description: normalize_description(description),
            category: category.into().trim().to_string(),
            frequency: 1,
            updated_at: Utc::now(),
        }
    }

    /// Record another sighting, adopting the latest category
    pub fn reinforce(&mut self, category: impl Into<String>) {
        self.category = category.into().trim().to_string();
        self.frequency += 1;
        self.updated_at = Utc::now();
    }

    /// Learned mappings only win once seen more than [`LEARNED_MIN_FREQUENCY`] times
    pub fn is_trusted(&self) -> bool {
        self.frequency > LEARNED_MIN_FREQUENCY
    }
}

pub fn normalize_description(description: &str) -> String {
    description.trim().to_lowercase()
}

/// Category suggested by the keyword table alone
pub fn keyword_category(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, category)| *category)
        .unwrap_or(FALLBACK_CATEGORY)
}
