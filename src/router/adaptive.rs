//! Adaptive capability updater.
//!
//! Folds measured per-model performance into the catalog's capability
//! vectors with exponential smoothing, so estimates track reality without
//! any single metrics batch dominating.

use serde::{Deserialize, Serialize};

use super::catalog::Capability;
use super::selection::ModelRouter;

/// Smoothing weight of one metrics batch.
pub const ADAPTATION_RATE: f64 = 0.05;

/// Minimum sample size before a batch is allowed to move the estimates.
pub const MIN_SAMPLE_SIZE: u64 = 10;

/// Measured performance of one model over a reporting period.
///
/// Capability fields are sparse: only dimensions actually measured move the
/// catalog entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_requests: u64,
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub creative_writing: Option<f64>,
    #[serde(default)]
    pub technical_content: Option<f64>,
    #[serde(default)]
    pub communication: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<f64>,
    #[serde(default)]
    pub data_analysis: Option<f64>,
}

impl PerformanceMetrics {
    /// The measured value for one dimension, if this batch includes it.
    pub fn measured(&self, capability: Capability) -> Option<f64> {
        match capability {
            Capability::CreativeWriting => self.creative_writing,
            Capability::TechnicalContent => self.technical_content,
            Capability::Communication => self.communication,
            Capability::Reasoning => self.reasoning,
            Capability::DataAnalysis => self.data_analysis,
        }
    }
}

/// Blend a stored estimate with a new measurement.
pub fn blend(current: f64, measured: f64) -> f64 {
    current * (1.0 - ADAPTATION_RATE) + measured * ADAPTATION_RATE
}

impl ModelRouter {
    /// Fold a metrics batch into a model's capability vector.
    ///
    /// No-op when the model is unknown or the sample is too small. Runs under
    /// the catalog write lock, so concurrent feedback ingestion serializes.
    pub async fn update_model_stats(&self, model_id: &str, metrics: &PerformanceMetrics) {
        if metrics.total_requests <= MIN_SAMPLE_SIZE {
            tracing::debug!(
                "Skipping stats update for {}: only {} requests in sample",
                model_id,
                metrics.total_requests
            );
            return;
        }

        let mut catalog = self.catalog.write().await;
        let known = catalog.update_capabilities(model_id, |caps| {
            for dim in Capability::ALL {
                if let Some(measured) = metrics.measured(dim) {
                    caps.set(dim, blend(caps.get(dim), measured));
                }
            }
        });

        if known {
            tracing::debug!("Updated capability estimates for {}", model_id);
        } else {
            tracing::warn!("Ignoring stats for unknown model {}", model_id);
        }
    }
}
