//! Usage recorder - actual consumption tracking.
//!
//! `track_usage` charges both budget windows, bumps in-memory per-model
//! counters, and hands snapshots to the persistence writer. Persistence is
//! fire-and-forget: failures are logged by the writer and never unwind the
//! in-memory state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::selection::ModelRouter;

/// A token count split into input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCount {
    pub input: u64,
    pub output: u64,
}

impl TokenCount {
    pub fn new(input: u64, output: u64) -> Self {
        Self { input, output }
    }

    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

impl Default for TokenCount {
    /// The default task estimate used when a caller does not supply one.
    fn default() -> Self {
        Self {
            input: 500,
            output: 1500,
        }
    }
}

/// One completed task's consumption. Append-only; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub model_id: String,
    pub tokens_input: u64,
    pub tokens_output: u64,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(model_id: &str, tokens: TokenCount, cost: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            model_id: model_id.to_string(),
            tokens_input: tokens.input,
            tokens_output: tokens.output,
            cost,
            timestamp: Utc::now(),
        }
    }
}

/// Running in-memory totals for one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub total_calls: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
}

impl ModelRouter {
    /// Record actual consumption for a completed task.
    ///
    /// Updates both budget windows and the per-model counters, then enqueues
    /// the budget snapshot and a ledger record for the background writer.
    /// Returns false only when the persistence outbox is gone; the in-memory
    /// update has still happened.
    pub async fn track_usage(&self, model_id: &str, tokens: TokenCount, actual_cost: f64) -> bool {
        let snapshot = {
            let mut budget = self.budget.write().await;
            budget.record_spend(actual_cost);
            budget.snapshot()
        };

        {
            let mut usage = self.usage.write().await;
            let entry = usage.entry(model_id.to_string()).or_default();
            entry.total_calls += 1;
            entry.total_tokens += tokens.total();
            entry.total_cost += actual_cost;
        }

        tracing::debug!(
            "Tracked usage for {}: {} tokens, {:.4} USD",
            model_id,
            tokens.total(),
            actual_cost
        );

        let budget_queued = self.persist.save_budget(snapshot);
        let usage_queued = self
            .persist
            .append_usage(UsageRecord::new(model_id, tokens, actual_cost));
        budget_queued && usage_queued
    }

    /// Per-model usage totals accumulated since startup.
    pub async fn usage_statistics(&self) -> std::collections::HashMap<String, ModelUsage> {
        self.usage.read().await.clone()
    }
}
