//! Transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::FinanceError;
use crate::models::{Owner, SeriesId, Transaction, TransactionId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Repository for transaction persistence with an owner index
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: owner -> transaction ids
    by_owner: RwLock<HashMap<Owner, Vec<TransactionId>>>,
}

fn newest_first(a: &Transaction, b: &Transaction) -> std::cmp::Ordering {
    b.occurred_at
        .cmp(&a.occurred_at)
        .then(b.created_at.cmp(&a.created_at))
}

impl TransactionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_owner: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and build the owner index
    pub fn load(&self) -> Result<(), FinanceError> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_owner = self.by_owner.write().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        by_owner.clear();

        for txn in file_data.transactions {
            by_owner.entry(txn.owner.clone()).or_default().push(txn.id);
            data.insert(txn.id, txn);
        }

        Ok(())
    }

    /// Save transactions to disk
    pub fn save(&self) -> Result<(), FinanceError> {
        let data = self.data.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        transactions.sort_by(newest_first);

        let file_data = TransactionData { transactions };
        write_json_atomic(&self.path, &file_data)
    }

    /// Get a transaction by ID, only if it belongs to `owner`
    pub fn get(&self, owner: &Owner, id: TransactionId) -> Result<Option<Transaction>, FinanceError> {
        let data = self.data.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).filter(|t| &t.owner == owner).cloned())
    }

    /// All transactions of an owner, newest first
    pub fn get_by_owner(&self, owner: &Owner) -> Result<Vec<Transaction>, FinanceError> {
        let data = self.data.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_owner = self.by_owner.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let ids = by_owner.get(owner).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut transactions: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        transactions.sort_by(newest_first);
        Ok(transactions)
    }

    /// Transactions of an owner within `[start, end]`
    pub fn get_by_date_range(
        &self,
        owner: &Owner,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, FinanceError> {
        Ok(self
            .get_by_owner(owner)?
            .into_iter()
            .filter(|t| t.occurred_at >= start && t.occurred_at <= end)
            .collect())
    }

    /// Find a transaction of `owner` by full id, display form or id prefix
    pub fn find(&self, owner: &Owner, reference: &str) -> Result<Option<Transaction>, FinanceError> {
        Ok(self
            .get_by_owner(owner)?
            .into_iter()
            .find(|t| t.id.matches_ref(reference)))
    }

    /// The transaction a series already materialized for `trigger`, if any
    pub fn find_materialized(
        &self,
        series: SeriesId,
        trigger: DateTime<Utc>,
    ) -> Result<Option<Transaction>, FinanceError> {
        let data = self.data.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data
            .values()
            .find(|t| t.series_id == Some(series) && t.occurred_at == trigger)
            .cloned())
    }

    /// Insert or update a transaction
    pub fn upsert(&self, txn: Transaction) -> Result<(), FinanceError> {
        let mut data = self.data.write().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_owner = self.by_owner.write().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(old) = data.get(&txn.id) {
            if let Some(ids) = by_owner.get_mut(&old.owner) {
                ids.retain(|&id| id != txn.id);
            }
        }
        by_owner.entry(txn.owner.clone()).or_default().push(txn.id);

        data.insert(txn.id, txn);
        Ok(())
    }

    /// Delete a transaction
    pub fn delete(&self, id: TransactionId) -> Result<bool, FinanceError> {
        let mut data = self.data.write().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_owner = self.by_owner.write().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        match data.remove(&id) {
            Some(txn) => {
                if let Some(ids) = by_owner.get_mut(&txn.owner) {
                    ids.retain(|&tid| tid != id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Count all stored transactions
    pub fn count(&self) -> Result<usize, FinanceError> {
        let data = self.data.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}
