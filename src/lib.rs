//! # automonet
//!
//! Cost-governed AI model routing for the automonet freelance-automation
//! system.
//!
//! The core is a synchronous decision function over in-memory state: given a
//! task type and a token estimate, pick the backend model that best fits the
//! task's requirement profile without blowing the rolling daily or monthly
//! budget. When nothing fits, a fallback cascade relaxes quality, switches
//! to cost-first selection, and finally reaches for the zero-cost local
//! model.
//!
//! ## Selection Flow
//!
//! ```text
//!   select(task) ──► strict threshold ──► relaxed threshold ──►
//!   cheapest-viable (budget < $1) ──► zero-cost local ──► NoViableModel
//! ```
//!
//! After a task completes, the caller reports actual usage; budget windows
//! and the usage ledger are updated, and measured performance periodically
//! flows back into the capability estimates.
//!
//! ## Modules
//! - `router`: catalog, profiles, fitness scoring, budget, selection cascade
//! - `storage`: configuration store and usage ledger (SQLite) + async writer
//! - `api`: axum HTTP surface for selection, usage and budget management
//! - `config`: environment-driven runtime configuration

pub mod api;
pub mod config;
pub mod router;
pub mod storage;

pub use config::Config;
pub use router::{ModelRouter, RouterError, SelectionResult, SharedRouter, TaskType};
