//! Background persistence writer.
//!
//! Budget snapshots and usage records are queued on an unbounded channel and
//! written by a dedicated task, so selection and usage tracking never wait on
//! durable-store latency. Write failures are logged and dropped; the next
//! successful snapshot write makes the store consistent again.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::router::budget::BudgetConfig;
use crate::router::usage::UsageRecord;

use super::{ConfigStore, UsageLedger};

/// One queued write.
#[derive(Debug, Clone)]
pub enum PersistRequest {
    /// Upsert the budget configuration with this snapshot.
    Budget(BudgetConfig),
    /// Append one usage record to the ledger.
    Usage(UsageRecord),
}

/// Sending side of the persistence outbox. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PersistHandle {
    tx: mpsc::UnboundedSender<PersistRequest>,
}

impl PersistHandle {
    /// Create a handle plus the receiving end, for the writer task or tests.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PersistRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a budget snapshot. Returns whether the outbox accepted it.
    pub fn save_budget(&self, config: BudgetConfig) -> bool {
        self.send(PersistRequest::Budget(config))
    }

    /// Queue a usage record. Returns whether the outbox accepted it.
    pub fn append_usage(&self, record: UsageRecord) -> bool {
        self.send(PersistRequest::Usage(record))
    }

    fn send(&self, request: PersistRequest) -> bool {
        if self.tx.send(request).is_err() {
            tracing::warn!("Persistence outbox closed, dropping write");
            false
        } else {
            true
        }
    }
}

/// Spawn the writer task and return the handle to feed it.
pub fn spawn(
    config_store: Arc<dyn ConfigStore>,
    ledger: Arc<dyn UsageLedger>,
) -> PersistHandle {
    let (handle, rx) = PersistHandle::channel();
    tokio::spawn(run(rx, config_store, ledger));
    handle
}

/// Drain the outbox until every sender is gone.
async fn run(
    mut rx: mpsc::UnboundedReceiver<PersistRequest>,
    config_store: Arc<dyn ConfigStore>,
    ledger: Arc<dyn UsageLedger>,
) {
    while let Some(request) = rx.recv().await {
        let result = match &request {
            PersistRequest::Budget(config) => config_store.save_budget_config(config).await,
            PersistRequest::Usage(record) => ledger.append_usage(record).await,
        };
        if let Err(e) = result {
            // In-memory state is authoritative; a later snapshot write
            // restores consistency.
            tracing::warn!("Persistence write failed: {e:#}");
        }
    }
    tracing::debug!("Persistence writer stopped");
}
