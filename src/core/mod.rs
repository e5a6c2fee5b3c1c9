//! Core domain logic: entity models, transaction normalization, bounded
//! fetch fan-out and dashboard aggregation.

pub mod analytics;
pub mod config;
pub mod fetch;
pub mod log;
pub mod model;
pub mod refresh;
pub mod transaction;

// Re-export main types for cleaner imports
pub use fetch::TransactionFeed;
pub use model::SourceKind;
pub use transaction::NormalizedTransaction;
