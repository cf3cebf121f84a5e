//! Storage - durable-state ports for the routing core.
//!
//! The engine only sees two contracts: a configuration store (budget config
//! upsert + model-stats read at startup) and an append-only usage ledger.
//! `sqlite` implements both on one database file; `writer` decouples them
//! from the synchronous decision path.

pub mod sqlite;
pub mod writer;

use async_trait::async_trait;

use crate::router::adaptive::PerformanceMetrics;
use crate::router::budget::BudgetConfig;
use crate::router::usage::UsageRecord;

pub use sqlite::SqliteStore;

/// Configuration store contract.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// The persisted budget configuration, if one has ever been written.
    async fn load_budget_config(&self) -> anyhow::Result<Option<BudgetConfig>>;

    /// Upsert the budget configuration.
    async fn save_budget_config(&self, config: &BudgetConfig) -> anyhow::Result<()>;

    /// Stored per-model performance metrics, fed through the adaptive
    /// updater at startup.
    async fn load_model_stats(&self) -> anyhow::Result<Vec<(String, PerformanceMetrics)>>;
}

/// Usage ledger contract: append-only consumption records.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    async fn append_usage(&self, record: &UsageRecord) -> anyhow::Result<()>;
}
