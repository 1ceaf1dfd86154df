//! Category prediction service
//!
//! Suggests a category for a free-text description. A mapping the owner
//! has confirmed often enough wins; otherwise a fixed keyword table is
//! consulted.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::audit::EntityType;
use crate::error::{FinanceError, FinanceResult};
use crate::models::prediction::{keyword_category, FALLBACK_CATEGORY};
use crate::models::{CategoryPrediction, Owner};
use crate::storage::Storage;

pub struct PredictionService<'a> {
    storage: &'a Storage,
}

/// Where a prediction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Learned,
    Keyword,
    Fallback,
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Learned => write!(f, "learned"),
            Self::Keyword => write!(f, "keyword"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub category: String,
    pub source: PredictionSource,
}

impl<'a> PredictionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn predict(&self, owner: &Owner, description: &str) -> FinanceResult<Prediction> {
        if description.trim().is_empty() {
            return Err(FinanceError::Validation("Description is required".into()));
        }

        if let Some(learned) = self.storage.predictions.get(owner, description)? {
            if learned.is_trusted() {
                debug!(description, category = %learned.category, "learned prediction");
                return Ok(Prediction {
                    category: learned.category,
                    source: PredictionSource::Learned,
                });
            }
        }

        let category = keyword_category(description);
        let source = if category == FALLBACK_CATEGORY {
            PredictionSource::Fallback
        } else {
            PredictionSource::Keyword
        };
        Ok(Prediction {
            category: category.to_string(),
            source,
        })
    }

    /// Record that `description` was filed under `category`
    pub fn learn(
        &self,
        owner: &Owner,
        description: &str,
        category: &str,
    ) -> FinanceResult<CategoryPrediction> {
        if description.trim().is_empty() || category.trim().is_empty() {
            return Err(FinanceError::Validation(
                "Description and category are required".into(),
            ));
        }

        let prediction = match self.storage.predictions.get(owner, description)? {
            Some(mut existing) => {
                let before = existing.clone();
                existing.reinforce(category);
                self.storage.predictions.upsert(existing.clone())?;
                self.storage.predictions.save()?;
                self.storage.log_update(
                    EntityType::CategoryPrediction,
                    existing.description.clone(),
                    owner,
                    None,
                    &before,
                    &existing,
                    None,
                )?;
                existing
            }
            None => {
                let created = CategoryPrediction::new(owner.clone(), description, category);
                self.storage.predictions.upsert(created.clone())?;
                self.storage.predictions.save()?;
                self.storage.log_create(
                    EntityType::CategoryPrediction,
                    created.description.clone(),
                    owner,
                    None,
                    &created,
                )?;
                created
            }
        };

        debug!(
            description = %prediction.description,
            category = %prediction.category,
            frequency = prediction.frequency,
            "learned category mapping"
        );
        Ok(prediction)
    }

    pub fn list(&self, owner: &Owner) -> FinanceResult<Vec<CategoryPrediction>> {
        self.storage.predictions.get_by_owner(owner)
    }
}
