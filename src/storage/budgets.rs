//! Budget repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FinanceError;
use crate::models::{Budget, BudgetId, Owner};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BudgetData {
    #[serde(default)]
    budgets: Vec<Budget>,
}

pub struct BudgetRepository {
    path: PathBuf,
    budgets: RwLock<HashMap<BudgetId, Budget>>,
}

impl BudgetRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            budgets: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), FinanceError> {
        let file_data: BudgetData = read_json(&self.path)?;

        let mut budgets = self
            .budgets
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        budgets.clear();
        for budget in file_data.budgets {
            budgets.insert(budget.id, budget);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), FinanceError> {
        let budgets = self
            .budgets
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut budget_list: Vec<_> = budgets.values().cloned().collect();
        budget_list.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(
            &self.path,
            &BudgetData {
                budgets: budget_list,
            },
        )
    }

    pub fn get(&self, owner: &Owner, id: BudgetId) -> Result<Option<Budget>, FinanceError> {
        let budgets = self
            .budgets
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(budgets.get(&id).filter(|b| &b.owner == owner).cloned())
    }

    /// All budgets of an owner, newest first
    pub fn get_by_owner(&self, owner: &Owner) -> Result<Vec<Budget>, FinanceError> {
        let budgets = self
            .budgets
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = budgets
            .values()
            .filter(|b| &b.owner == owner)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    pub fn find(&self, owner: &Owner, reference: &str) -> Result<Option<Budget>, FinanceError> {
        Ok(self
            .get_by_owner(owner)?
            .into_iter()
            .find(|b| b.id.matches_ref(reference)))
    }

    /// First other budget occupying the same (owner, category, period) slot
    pub fn find_conflict(&self, budget: &Budget) -> Result<Option<Budget>, FinanceError> {
        let budgets = self
            .budgets
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(budgets.values().find(|b| budget.conflicts_with(b)).cloned())
    }

    pub fn upsert(&self, budget: Budget) -> Result<(), FinanceError> {
        let mut budgets = self
            .budgets
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        budgets.insert(budget.id, budget);
        Ok(())
    }

    pub fn delete(&self, id: BudgetId) -> Result<bool, FinanceError> {
        let mut budgets = self
            .budgets
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(budgets.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPeriod, Money};
    use chrono::Utc;
    use tempfile::TempDir;

    fn budget(who: &str, category: &str) -> Budget {
        Budget::new(
            Owner::new(who).unwrap(),
            category,
            Money::from_cents(20000),
            BudgetPeriod::Monthly,
            Utc::now(),
        )
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");
        let repo = BudgetRepository::new(path.clone());
        let b = budget("alice", "Food");
        let id = b.id;
        repo.upsert(b).unwrap();
        repo.save().unwrap();

        let repo2 = BudgetRepository::new(path);
        repo2.load().unwrap();
        let alice = Owner::new("alice").unwrap();
        assert_eq!(repo2.get(&alice, id).unwrap().unwrap().category, "Food");
    }

    #[test]
    fn test_owner_isolation_and_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        let repo = BudgetRepository::new(temp_dir.path().join("budgets.json"));
        let food = budget("alice", "Food");
        let id = food.id;
        repo.upsert(food).unwrap();
        repo.upsert(budget("bob", "Food")).unwrap();

        let bob = Owner::new("bob").unwrap();
        assert!(repo.get(&bob, id).unwrap().is_none());
        assert_eq!(repo.get_by_owner(&bob).unwrap().len(), 1);

        assert!(repo.find_conflict(&budget("alice", "Food")).unwrap().is_some());
        assert!(repo.find_conflict(&budget("alice", "Rent")).unwrap().is_none());

        assert!(repo.delete(id).unwrap());
        assert!(repo.find_conflict(&budget("alice", "Food")).unwrap().is_none());
    }
}
