//! Category prediction repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FinanceError;
use crate::models::prediction::normalize_description;
use crate::models::{CategoryPrediction, Owner};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct PredictionData {
    #[serde(default)]
    predictions: Vec<CategoryPrediction>,
}

/// Keyed by (owner, normalized description)
pub struct PredictionRepository {
    path: PathBuf,
    predictions: RwLock<HashMap<(Owner, String), CategoryPrediction>>,
}

impl PredictionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            predictions: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), FinanceError> {
        let file_data: PredictionData = read_json(&self.path)?;

        let mut predictions = self
            .predictions
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        predictions.clear();
        for p in file_data.predictions {
            predictions.insert((p.owner.clone(), p.description.clone()), p);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), FinanceError> {
        let predictions = self
            .predictions
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = predictions.values().cloned().collect();
        list.sort_by(|a, b| {
            a.owner
                .cmp(&b.owner)
                .then_with(|| a.description.cmp(&b.description))
        });

        write_json_atomic(&self.path, &PredictionData { predictions: list })
    }

    pub fn get(
        &self,
        owner: &Owner,
        description: &str,
    ) -> Result<Option<CategoryPrediction>, FinanceError> {
        let predictions = self
            .predictions
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(predictions
            .get(&(owner.clone(), normalize_description(description)))
            .cloned())
    }

    pub fn get_by_owner(&self, owner: &Owner) -> Result<Vec<CategoryPrediction>, FinanceError> {
        let predictions = self
            .predictions
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = predictions
            .values()
            .filter(|p| &p.owner == owner)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.description.cmp(&b.description)));
        Ok(list)
    }

    pub fn upsert(&self, prediction: CategoryPrediction) -> Result<(), FinanceError> {
        let mut predictions = self
            .predictions
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        predictions.insert(
            (prediction.owner.clone(), prediction.description.clone()),
            prediction,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_is_case_insensitive_and_owner_scoped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("predictions.json");
        let repo = PredictionRepository::new(path.clone());
        let alice = Owner::new("alice").unwrap();
        repo.upsert(CategoryPrediction::new(alice.clone(), "Netflix", "Entertainment"))
            .unwrap();
        repo.save().unwrap();

        let repo2 = PredictionRepository::new(path);
        repo2.load().unwrap();
        assert!(repo2.get(&alice, "  NETFLIX").unwrap().is_some());
        assert!(repo2
            .get(&Owner::new("bob").unwrap(), "netflix")
            .unwrap()
            .is_none());
        assert_eq!(repo2.get_by_owner(&alice).unwrap().len(), 1);
    }
}
