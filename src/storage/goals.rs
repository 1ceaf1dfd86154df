//! Savings goal repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::FinanceError;
use crate::models::{Goal, GoalId, Owner};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct GoalData {
    #[serde(default)]
    goals: Vec<Goal>,
}

pub struct GoalRepository {
    path: PathBuf,
    goals: RwLock<HashMap<GoalId, Goal>>,
}

impl GoalRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            goals: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), FinanceError> {
        let file_data: GoalData = read_json(&self.path)?;

        let mut goals = self
            .goals
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        goals.clear();
        for goal in file_data.goals {
            goals.insert(goal.id, goal);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), FinanceError> {
        let goals = self
            .goals
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut goal_list: Vec<_> = goals.values().cloned().collect();
        goal_list.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &GoalData { goals: goal_list })
    }

    pub fn get(&self, owner: &Owner, id: GoalId) -> Result<Option<Goal>, FinanceError> {
        let goals = self
            .goals
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(goals.get(&id).filter(|g| &g.owner == owner).cloned())
    }

    /// All goals of an owner ordered by deadline
    pub fn get_by_owner(&self, owner: &Owner) -> Result<Vec<Goal>, FinanceError> {
        let goals = self
            .goals
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = goals.values().filter(|g| &g.owner == owner).cloned().collect();
        list.sort_by(|a, b| a.deadline.cmp(&b.deadline).then(a.name.cmp(&b.name)));
        Ok(list)
    }

    pub fn find(&self, owner: &Owner, reference: &str) -> Result<Option<Goal>, FinanceError> {
        Ok(self
            .get_by_owner(owner)?
            .into_iter()
            .find(|g| g.id.matches_ref(reference)))
    }

    /// First other goal with the same owner, name, target and deadline
    pub fn find_conflict(&self, goal: &Goal) -> Result<Option<Goal>, FinanceError> {
        let goals = self
            .goals
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(goals.values().find(|g| goal.conflicts_with(g)).cloned())
    }

    pub fn upsert(&self, goal: Goal) -> Result<(), FinanceError> {
        let mut goals = self
            .goals
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        goals.insert(goal.id, goal);
        Ok(())
    }

    pub fn delete(&self, id: GoalId) -> Result<bool, FinanceError> {
        let mut goals = self
            .goals
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(goals.remove(&id).is_some())
    }
}
