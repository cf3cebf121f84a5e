//! Fitness scorer - pure suitability scoring of a model against a profile.
//!
//! This is the single source of truth for ranking: deterministic,
//! side-effect-free, and kept separate from all IO.

use super::catalog::{Capability, LatencyClass, Model};
use super::profile::TaskProfile;

/// Reference output rate (USD per 1k tokens) against which cost-sensitive
/// profiles discount expensive models.
const COST_REFERENCE_RATE: f64 = 0.1;

/// Floor of the cost multiplier; even the priciest model keeps half its score.
const COST_FACTOR_FLOOR: f64 = 0.5;

/// Suitability of `model` for the work described by `profile`.
///
/// Weighted capability average, normalized by total weight, then adjusted by
/// cost and speed multipliers when the profile asks for them. A zero total
/// weight scores 0.
pub fn fitness(model: &Model, profile: &TaskProfile) -> f64 {
    let mut capability_score = 0.0;
    let mut total_weight = 0.0;

    for dim in Capability::ALL {
        let weight = profile.requirements.get(dim);
        let capability = model.capabilities.get(dim);
        capability_score += capability * weight;
        total_weight += weight;
    }

    let raw_score = if total_weight > 0.0 {
        capability_score / total_weight
    } else {
        0.0
    };

    let cost_factor = if profile.prioritize_cost {
        // Models cheap relative to the reference rate lose little; expensive
        // ones are capped at the floor multiplier.
        (1.0 - (model.cost_per_1k.output * 3.0) / COST_REFERENCE_RATE).max(COST_FACTOR_FLOOR)
    } else {
        1.0
    };

    let speed_factor = if profile.prioritize_speed {
        match model.latency {
            LatencyClass::Fast => 1.2,
            LatencyClass::Medium => 1.0,
            LatencyClass::Slow => 0.8,
        }
    } else {
        1.0
    };

    raw_score * cost_factor * speed_factor
}
