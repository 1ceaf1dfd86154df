//! FinTrack - personal finance tracking
//!
//! This library provides the core functionality for the FinTrack command
//! line application: income and expense records, per-period budgets with
//! threshold alerts, savings goals with milestones, and recurring
//! transaction series fired by an external timer.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (transactions, budgets, goals, series)
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer, including the period accounting
//!   engine and the recurring transaction generator
//! - `reports`: Read-only analytics
//! - `audit`: Audit logging system
//! - `export`: CSV, JSON and YAML export
//!
//! # Example
//!
//! ```rust,ignore
//! use fintrack::config::{paths::FinTrackPaths, settings::Settings};
//! use fintrack::storage::Storage;
//!
//! let paths = FinTrackPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//! ```

pub mod audit;
pub mod cli;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{FinanceError, FinanceResult};
