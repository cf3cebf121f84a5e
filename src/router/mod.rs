//! Router module - adaptive, cost-governed model selection.
//!
//! # Key Concepts
//! - Catalog: registry of AI backends with capability vectors and cost rates
//! - Profiles: weighted requirements and quality policy per task category
//! - Fitness: pure scoring of a model against a profile
//! - Budget: rolling daily/monthly spend windows with lazy calendar resets
//! - Selection: the fallback cascade that picks a model under constraints
//! - Adaptive: exponential smoothing of capabilities toward measured data
//! - Usage: consumption tracking that feeds budget and ledger

pub mod adaptive;
pub mod budget;
pub mod catalog;
pub mod error;
pub mod fitness;
pub mod profile;
pub mod selection;
pub mod usage;

pub use adaptive::{PerformanceMetrics, ADAPTATION_RATE, MIN_SAMPLE_SIZE};
pub use budget::{BudgetConfig, BudgetStatus, BudgetTracker, BudgetWindow, WindowKind, WindowStatus};
pub use catalog::{Capability, CapabilityVector, CostPer1k, LatencyClass, Model, ModelCatalog, Provider};
pub use error::RouterError;
pub use fitness::fitness;
pub use profile::{ProfileRegistry, TaskProfile, TaskType};
pub use selection::{ModelRouter, SelectionResult, SharedRouter};
pub use usage::{ModelUsage, TokenCount, UsageRecord};
