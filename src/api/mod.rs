//! HTTP API for the routing service.
//!
//! - `routes`: shared state and server bootstrap
//! - `ai`: model selection, usage reporting, catalog and stats endpoints
//! - `budget`: budget status and limit management

pub mod ai;
pub mod budget;
pub mod routes;

pub use routes::{serve, AppState};
