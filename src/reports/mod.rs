//! Reports module for FinTrack
//!
//! Provides analytics over an owner's history: net totals by category,
//! monthly income and expenses, an overall overview and budget-based
//! spending recommendations.

pub mod monthly;
pub mod overview;
pub mod recommendations;
pub mod spending;

pub use monthly::{MonthlyReport, MonthlyTotal};
pub use overview::OverviewReport;
pub use recommendations::{Recommendation, RecommendationReport};
pub use spending::{CategoryTotal, CategoryTotalsReport};
