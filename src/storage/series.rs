//! Recurring series repository: the persisted job table

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::FinanceError;
use crate::models::{Owner, RecurringSeries, SeriesId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct SeriesData {
    #[serde(default)]
    series: Vec<RecurringSeries>,
}

pub struct SeriesRepository {
    path: PathBuf,
    series: RwLock<HashMap<SeriesId, RecurringSeries>>,
}

impl SeriesRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            series: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), FinanceError> {
        let file_data: SeriesData = read_json(&self.path)?;

        let mut series = self
            .series
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        series.clear();
        for s in file_data.series {
            series.insert(s.id, s);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), FinanceError> {
        let series = self
            .series
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = series.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &SeriesData { series: list })
    }

    pub fn get(&self, owner: &Owner, id: SeriesId) -> Result<Option<RecurringSeries>, FinanceError> {
        let series = self
            .series
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(series.get(&id).filter(|s| &s.owner == owner).cloned())
    }

    pub fn get_by_owner(&self, owner: &Owner) -> Result<Vec<RecurringSeries>, FinanceError> {
        let series = self
            .series
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = series.values().filter(|s| &s.owner == owner).cloned().collect();
        list.sort_by(|a, b| a.next_trigger.cmp(&b.next_trigger));
        Ok(list)
    }

    pub fn find(&self, owner: &Owner, reference: &str) -> Result<Option<RecurringSeries>, FinanceError> {
        Ok(self
            .get_by_owner(owner)?
            .into_iter()
            .find(|s| s.id.matches_ref(reference)))
    }

    /// Every scheduled series due at `now`, across all owners, earliest first
    pub fn get_due(&self, now: DateTime<Utc>) -> Result<Vec<RecurringSeries>, FinanceError> {
        let series = self
            .series
            .read()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut due: Vec<_> = series.values().filter(|s| s.is_due(now)).cloned().collect();
        due.sort_by(|a, b| a.next_trigger.cmp(&b.next_trigger));
        Ok(due)
    }

    pub fn upsert(&self, s: RecurringSeries) -> Result<(), FinanceError> {
        let mut series = self
            .series
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        series.insert(s.id, s);
        Ok(())
    }

    pub fn delete(&self, id: SeriesId) -> Result<bool, FinanceError> {
        let mut series = self
            .series
            .write()
            .map_err(|e| FinanceError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(series.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, Money, RecurrenceRule, Transaction, TransactionKind};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn series(who: &str, day: u32) -> RecurringSeries {
        let at = Utc.with_ymd_and_hms(2025, 1, day, 8, 0, 0).unwrap();
        let template = Transaction::new(
            Owner::new(who).unwrap(),
            TransactionKind::Income,
            "Salary",
            Money::from_cents(300_000),
            "USD",
            at,
            at,
        );
        RecurringSeries::start(&template, &RecurrenceRule::new(Frequency::Weekly), at)
    }

    #[test]
    fn test_get_due_spans_owners() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SeriesRepository::new(temp_dir.path().join("series.json"));
        repo.upsert(series("alice", 1)).unwrap();
        repo.upsert(series("bob", 2)).unwrap();
        repo.upsert(series("carol", 20)).unwrap();

        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let due = repo.get_due(now).unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].owner.as_str(), "alice");
    }

    #[test]
    fn test_save_reload_and_scoping() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("series.json");
        let repo = SeriesRepository::new(path.clone());
        let s = series("alice", 1);
        let id = s.id;
        repo.upsert(s).unwrap();
        repo.save().unwrap();

        let repo2 = SeriesRepository::new(path);
        repo2.load().unwrap();
        let alice = Owner::new("alice").unwrap();
        assert!(repo2.get(&alice, id).unwrap().is_some());
        assert!(repo2.get(&Owner::new("bob").unwrap(), id).unwrap().is_none());
        assert_eq!(repo2.get_by_owner(&alice).unwrap().len(), 1);

        assert!(repo2.delete(id).unwrap());
        assert!(!repo2.delete(id).unwrap());
        assert!(repo2.get(&alice, id).unwrap().is_none());
    }
}
