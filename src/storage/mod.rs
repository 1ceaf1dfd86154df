//! Storage layer for FinTrack
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation, plus the audit hooks every mutating service goes through.

pub mod budgets;
pub mod file_io;
pub mod goals;
pub mod predictions;
pub mod series;
pub mod transactions;

pub use budgets::BudgetRepository;
pub use file_io::{read_json, write_json_atomic};
pub use goals::GoalRepository;
pub use predictions::PredictionRepository;
pub use series::SeriesRepository;
pub use transactions::TransactionRepository;

use serde::Serialize;

use crate::audit::{generate_diff, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::FinTrackPaths;
use crate::error::FinanceResult;
use crate::models::Owner;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: FinTrackPaths,
    audit: AuditLogger,
    pub transactions: TransactionRepository,
    pub budgets: BudgetRepository,
    pub goals: GoalRepository,
    pub series: SeriesRepository,
    pub predictions: PredictionRepository,
}

impl Storage {
    /// Create a new Storage instance, creating directories as needed
    pub fn new(paths: FinTrackPaths) -> FinanceResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            goals: GoalRepository::new(paths.goals_file()),
            series: SeriesRepository::new(paths.series_file()),
            predictions: PredictionRepository::new(paths.predictions_file()),
            paths,
        })
    }

    /// Create storage and load every collection from disk
    pub fn open(paths: FinTrackPaths) -> FinanceResult<Self> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &FinTrackPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&self) -> FinanceResult<()> {
        self.transactions.load()?;
        self.budgets.load()?;
        self.goals.load()?;
        self.series.load()?;
        self.predictions.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> FinanceResult<()> {
        self.transactions.save()?;
        self.budgets.save()?;
        self.goals.save()?;
        self.series.save()?;
        self.predictions.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        owner: &Owner,
        entity_name: Option<String>,
        entity: &T,
    ) -> FinanceResult<()> {
        self.audit.log(&AuditEntry::create(
            entity_type,
            entity_id,
            owner,
            entity_name,
            entity,
        ))
    }

    /// Log an update; when no summary is given one is derived from the
    /// before and after states
    #[allow(clippy::too_many_arguments)]
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        owner: &Owner,
        entity_name: Option<String>,
        before: &T,
        after: &T,
        diff_summary: Option<String>,
    ) -> FinanceResult<()> {
        let mut entry = AuditEntry::update(
            entity_type,
            entity_id,
            owner,
            entity_name,
            before,
            after,
            diff_summary,
        );
        if entry.diff_summary.is_none() {
            if let (Some(b), Some(a)) = (&entry.before, &entry.after) {
                entry.diff_summary = generate_diff(b, a);
            }
        }
        self.audit.log(&entry)
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        owner: &Owner,
        entity_name: Option<String>,
        entity: &T,
    ) -> FinanceResult<()> {
        self.audit.log(&AuditEntry::delete(
            entity_type,
            entity_id,
            owner,
            entity_name,
            entity,
        ))
    }
}
