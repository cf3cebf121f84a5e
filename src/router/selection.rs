//! Selection engine - picks the best model for a task under budget and
//! quality constraints.
//!
//! The cascade, in order: strict threshold, one relaxed retry at the
//! profile's minimum acceptable score, cheapest-viable override when budget
//! is nearly gone, zero-cost local fallback, hard failure.
//!
//! `ModelRouter` is an explicitly constructed service object; callers own
//! its lifecycle and share it behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::storage::writer::PersistHandle;

use super::budget::{BudgetStatus, BudgetTracker};
use super::catalog::{Model, ModelCatalog, Provider};
use super::error::RouterError;
use super::fitness::fitness;
use super::profile::{ProfileRegistry, TaskProfile, TaskType};
use super::usage::{ModelUsage, TokenCount};

/// Quality floor applied when the caller forces high quality.
const FORCED_QUALITY_THRESHOLD: f64 = 0.9;

/// Below this much remaining budget (USD), selection switches to the
/// cheapest-viable policy.
const SCARCITY_THRESHOLD: f64 = 1.0;

/// The outcome of a successful selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub model_id: String,
    pub provider: Provider,
    pub estimated_cost: f64,
    /// Raw scorer output for the chosen model; not re-normalized.
    pub fitness: f64,
    pub token_limit: u64,
}

/// A model that survived the quality and budget filters.
#[derive(Debug, Clone)]
struct Candidate {
    model_id: String,
    provider: Provider,
    fitness: f64,
    estimated_cost: f64,
    token_limit: u64,
}

impl Candidate {
    fn into_result(self) -> SelectionResult {
        SelectionResult {
            model_id: self.model_id,
            provider: self.provider,
            estimated_cost: self.estimated_cost,
            fitness: self.fitness,
            token_limit: self.token_limit,
        }
    }
}

/// The routing service: catalog, profiles, budget state, usage counters and
/// the persistence outbox, all injected at construction.
pub struct ModelRouter {
    pub(crate) catalog: RwLock<ModelCatalog>,
    profiles: ProfileRegistry,
    pub(crate) budget: RwLock<BudgetTracker>,
    pub(crate) usage: RwLock<HashMap<String, ModelUsage>>,
    pub(crate) persist: PersistHandle,
}

/// Shared router handle for concurrent callers.
pub type SharedRouter = Arc<ModelRouter>;

impl ModelRouter {
    pub fn new(
        catalog: ModelCatalog,
        profiles: ProfileRegistry,
        budget: BudgetTracker,
        persist: PersistHandle,
    ) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            profiles,
            budget: RwLock::new(budget),
            usage: RwLock::new(HashMap::new()),
            persist,
        }
    }

    /// Select the best model for a task, by task type name.
    ///
    /// Unknown names fail with [`RouterError::UnknownTaskType`] before any
    /// budget state is read or mutated.
    pub async fn select_model_named(
        &self,
        task_type: &str,
        estimate: TokenCount,
        force_high_quality: bool,
    ) -> Result<SelectionResult, RouterError> {
        let task_type: TaskType = task_type.parse()?;
        self.select_model(task_type, estimate, force_high_quality).await
    }

    /// Select the best model for a task.
    ///
    /// Guarantee: the result's `estimated_cost` fits the available budget, or
    /// the result is the zero-cost local fallback.
    pub async fn select_model(
        &self,
        task_type: TaskType,
        estimate: TokenCount,
        force_high_quality: bool,
    ) -> Result<SelectionResult, RouterError> {
        let profile = self.profiles.get(task_type);

        // Lazy reset must run before any headroom read. Selection then works
        // from the snapshot; millisecond staleness is acceptable.
        let available = {
            let mut budget = self.budget.write().await;
            if budget.check_and_reset(Utc::now()) {
                self.persist.save_budget(budget.snapshot());
            }
            budget.available()
        };

        let catalog = self.catalog.read().await;

        let threshold = if force_high_quality {
            FORCED_QUALITY_THRESHOLD
        } else {
            profile.quality_threshold
        };
        let mut candidates = rank_candidates(&catalog, profile, estimate, threshold, available);

        // Single bounded relaxation. A forced-quality call never relaxes; it
        // falls through to the fallback branches instead.
        if candidates.is_empty() && !force_high_quality {
            tracing::debug!(
                "No candidate for {} at threshold {:.2}, retrying at {:.2}",
                task_type,
                threshold,
                profile.min_acceptable_score
            );
            candidates = rank_candidates(
                &catalog,
                profile,
                estimate,
                profile.min_acceptable_score,
                available,
            );
        }

        // Money nearly gone: cost-first override, still honoring the
        // profile's minimum acceptable score.
        if available < SCARCITY_THRESHOLD && !candidates.is_empty() {
            let mut by_cost = candidates.clone();
            by_cost.sort_by(|a, b| a.estimated_cost.total_cmp(&b.estimated_cost));
            if let Some(cheapest) = by_cost
                .into_iter()
                .find(|c| c.fitness >= profile.min_acceptable_score)
            {
                tracing::info!(
                    "Budget nearly exhausted ({:.2} USD left), picked cheapest viable {}",
                    available,
                    cheapest.model_id
                );
                return Ok(cheapest.into_result());
            }
        }

        if let Some(best) = candidates.into_iter().next() {
            tracing::debug!(
                "Selected {} for {} (fitness {:.3}, est. cost {:.4})",
                best.model_id,
                task_type,
                best.fitness,
                best.estimated_cost
            );
            return Ok(best.into_result());
        }

        // Hard fallback: the zero-cost local backend, regardless of fitness.
        if let Some(local) = catalog.local_fallback() {
            tracing::warn!(
                "No candidate for {} within budget {:.2}, falling back to {}",
                task_type,
                available,
                local.id
            );
            return Ok(SelectionResult {
                model_id: local.id.clone(),
                provider: local.provider,
                estimated_cost: 0.0,
                fitness: fitness(local, profile),
                token_limit: local.token_limit,
            });
        }

        Err(RouterError::NoViableModel)
    }

    /// Current budget status, running the lazy reset check first.
    pub async fn budget_status(&self) -> BudgetStatus {
        let now = Utc::now();
        let mut budget = self.budget.write().await;
        if budget.check_and_reset(now) {
            self.persist.save_budget(budget.snapshot());
        }
        budget.status(now)
    }

    /// Replace both budget limits and persist the new configuration.
    /// Returns whether the write was queued.
    pub async fn update_budget_limits(&self, daily_limit: f64, monthly_limit: f64) -> bool {
        let snapshot = {
            let mut budget = self.budget.write().await;
            budget.set_limits(daily_limit, monthly_limit);
            budget.snapshot()
        };
        tracing::info!(
            "Budget limits updated: daily {:.2}, monthly {:.2}",
            daily_limit,
            monthly_limit
        );
        self.persist.save_budget(snapshot)
    }

    /// Snapshot of the current catalog (for the models API).
    pub async fn models(&self) -> Vec<Model> {
        self.catalog.read().await.models().cloned().collect()
    }
}

/// Score and filter the catalog, returning candidates sorted by fitness
/// descending.
fn rank_candidates(
    catalog: &ModelCatalog,
    profile: &TaskProfile,
    estimate: TokenCount,
    threshold: f64,
    available: f64,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = catalog
        .models()
        .filter_map(|model| {
            let score = fitness(model, profile);
            let estimated_cost = model.estimated_cost(estimate.input, estimate.output);
            (score >= threshold && estimated_cost <= available).then(|| Candidate {
                model_id: model.id.clone(),
                provider: model.provider,
                fitness: score,
                estimated_cost,
                token_limit: model.token_limit,
            })
        })
        .collect();
    candidates.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    candidates
}

#[cfg(test)]
impl ModelRouter {
    /// Test helper: one capability rating from the live catalog.
    pub(crate) async fn capability(
        &self,
        model_id: &str,
        dim: super::catalog::Capability,
    ) -> f64 {
        self.catalog
            .read()
            .await
            .get(model_id)
            .expect("model exists")
            .capabilities
            .get(dim)
    }

    /// Test helper: number of catalog entries.
    pub(crate) async fn catalog_len(&self) -> usize {
        self.catalog.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::catalog::{CapabilityVector, CostPer1k, LatencyClass};
    use crate::router::fitness::fitness;
    type Outbox = tokio::sync::mpsc::UnboundedReceiver<crate::storage::writer::PersistRequest>;

    fn builtin_router(daily_used: f64) -> (ModelRouter, Outbox) {
        let (persist, rx) = PersistHandle::channel();
        let now = Utc::now();
        let mut budget = BudgetTracker::new(20.0, 300.0, now);
        budget.record_spend(daily_used);
        let router = ModelRouter::new(
            ModelCatalog::builtin(),
            ProfileRegistry::builtin(),
            budget,
            persist,
        );
        (router, rx)
    }

    /// A model with uniform capability `score`; with an all-ones requirement
    /// vector and no cost/speed priority its fitness is exactly `score`. With
    /// a 1000/1000 token estimate its estimated cost is exactly `cost`.
    fn flat_model(id: &str, score: f64, cost: f64) -> Model {
        Model {
            id: id.to_string(),
            provider: Provider::OpenRouter,
            capabilities: CapabilityVector::new(score, score, score, score, score),
            cost_per_1k: CostPer1k::new(0.0, cost),
            token_limit: 32_000,
            latency: LatencyClass::Medium,
            priority: 1,
        }
    }

    fn flat_estimate() -> TokenCount {
        TokenCount::new(1000, 1000)
    }

    fn custom_router(models: Vec<Model>, daily_limit: f64, daily_used: f64) -> (ModelRouter, Outbox) {
        let (persist, rx) = PersistHandle::channel();
        let now = Utc::now();
        let mut budget = BudgetTracker::new(daily_limit, 300.0, now);
        budget.record_spend(daily_used);
        let router = ModelRouter::new(
            ModelCatalog::new(models),
            ProfileRegistry::builtin(),
            budget,
            persist,
        );
        (router, rx)
    }

    #[tokio::test]
    async fn test_ample_budget_meets_quality_threshold() {
        let (router, _rx) = builtin_router(0.0);
        let registry = ProfileRegistry::builtin();
        for task_type in TaskType::ALL {
            let result = router
                .select_model(task_type, TokenCount::default(), false)
                .await
                .unwrap();
            let profile = registry.get(task_type);
            assert!(
                result.fitness >= profile.quality_threshold,
                "{task_type}: fitness {} below {}",
                result.fitness,
                profile.quality_threshold
            );
        }
    }

    #[tokio::test]
    async fn test_estimated_cost_is_exact_recomputation() {
        let (router, _rx) = builtin_router(0.0);
        let estimate = TokenCount::new(800, 2500);
        for task_type in TaskType::ALL {
            let result = router.select_model(task_type, estimate, false).await.unwrap();
            let models = router.models().await;
            let chosen = models.iter().find(|m| m.id == result.model_id).unwrap();
            let expected = estimate.input as f64 * chosen.cost_per_1k.input / 1000.0
                + estimate.output as f64 * chosen.cost_per_1k.output / 1000.0;
            assert!((result.estimated_cost - expected).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn test_force_high_quality_raises_the_bar() {
        let (router, _rx) = builtin_router(0.0);
        let result = router
            .select_model(TaskType::JobFiltering, TokenCount::default(), true)
            .await
            .unwrap();
        assert!(result.fitness >= 0.9);
    }

    #[tokio::test]
    async fn test_relaxed_retry_when_quality_unreachable() {
        // ProjectPlanning: threshold 0.75, min acceptable 0.75 is also the
        // floor, so use ClientCommunication (threshold 0.8, floor 0.75) with
        // a single model sitting between the two.
        let (router, _rx) = custom_router(vec![flat_model("mid", 0.77, 0.01)], 20.0, 0.0);
        let result = router
            .select_model(TaskType::ClientCommunication, flat_estimate(), false)
            .await
            .unwrap();
        assert_eq!(result.model_id, "mid");
        assert!((result.fitness - 0.77).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_forced_quality_never_relaxes() {
        // The only model would pass the relaxed floor but not 0.9, and there
        // is no zero-cost fallback: the call must fail.
        let (router, _rx) = custom_router(vec![flat_model("mid", 0.77, 0.01)], 20.0, 0.0);
        let err = router
            .select_model(TaskType::ClientCommunication, flat_estimate(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::NoViableModel));
    }

    #[tokio::test]
    async fn test_scarcity_override_prefers_cheapest_viable() {
        // 0.50 USD left. A: fitness 0.95, cost 0.45. B: fitness 0.80,
        // cost 0.30. Both affordable and above ClientCommunication's floor
        // (0.75); scarcity mode must pick B despite A's higher fitness.
        let (router, _rx) = custom_router(
            vec![flat_model("model-a", 0.95, 0.45), flat_model("model-b", 0.80, 0.30)],
            20.0,
            19.5,
        );
        let result = router
            .select_model(TaskType::ClientCommunication, flat_estimate(), false)
            .await
            .unwrap();
        assert_eq!(result.model_id, "model-b");
        assert!((result.estimated_cost - 0.30).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_scarcity_unaffordable_high_scorer_is_not_even_a_candidate() {
        // The spec's literal scenario: A costs 0.80 with only 0.50 left, so A
        // already fails the budget filter; B is returned.
        let (router, _rx) = custom_router(
            vec![flat_model("model-a", 0.95, 0.80), flat_model("model-b", 0.80, 0.30)],
            20.0,
            19.5,
        );
        let result = router
            .select_model(TaskType::ClientCommunication, flat_estimate(), false)
            .await
            .unwrap();
        assert_eq!(result.model_id, "model-b");
    }

    #[tokio::test]
    async fn test_fitness_ranking_with_ample_budget() {
        // With plenty of headroom the cost-first override never engages and
        // the fitness-ranked head wins.
        let (router, _rx) = custom_router(
            vec![flat_model("strong", 0.90, 0.10), flat_model("weak", 0.78, 0.05)],
            20.0,
            0.0,
        );
        let result = router
            .select_model(TaskType::ProjectPlanning, flat_estimate(), false)
            .await
            .unwrap();
        assert_eq!(result.model_id, "strong");
    }

    #[tokio::test]
    async fn test_hard_fallback_to_local_model() {
        // Budget fully exhausted; only the free local model survives the
        // cost filter, but it cannot meet any threshold, so the explicit
        // fallback branch returns it with a zero estimate.
        let (router, _rx) = builtin_router(20.0);
        let result = router
            .select_model(TaskType::ProposalGeneration, TokenCount::default(), false)
            .await
            .unwrap();
        assert_eq!(result.model_id, "local-llama3");
        assert_eq!(result.estimated_cost, 0.0);
        assert_eq!(result.provider, Provider::Ollama);
        // Fitness is the real scorer output, not a placeholder.
        let models = router.models().await;
        let local = models.iter().find(|m| m.id == "local-llama3").unwrap();
        let profile = ProfileRegistry::builtin().get(TaskType::ProposalGeneration).clone();
        assert!((result.fitness - fitness(local, &profile)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_no_viable_model_without_fallback() {
        // Exhausted budget and no zero-cost model in the catalog.
        let (router, _rx) = custom_router(vec![flat_model("paid", 0.95, 0.50)], 20.0, 20.0);
        let err = router
            .select_model(TaskType::ProposalGeneration, flat_estimate(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::NoViableModel));
    }

    #[tokio::test]
    async fn test_unknown_task_type_mutates_nothing() {
        let (persist, mut rx) = PersistHandle::channel();
        let router = ModelRouter::new(
            ModelCatalog::builtin(),
            ProfileRegistry::builtin(),
            BudgetTracker::new(20.0, 300.0, Utc::now()),
            persist,
        );
        let err = router
            .select_model_named("interpretive_dance", TokenCount::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::UnknownTaskType(_)));
        let status = router.budget_status().await;
        assert_eq!(status.daily.used, 0.0);
        // No persistence traffic either.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_selection_after_calendar_reset_sees_fresh_budget() {
        use crate::storage::writer::PersistRequest;

        // Tracker last reset "yesterday" with the daily window exhausted; the
        // selection-time lazy reset must clear it and persist the new state.
        let yesterday = Utc::now() - chrono::Duration::days(1);
        let mut budget = BudgetTracker::new(20.0, 300.0, yesterday);
        budget.record_spend(20.0);

        let (persist, mut rx) = PersistHandle::channel();
        let router = ModelRouter::new(
            ModelCatalog::builtin(),
            ProfileRegistry::builtin(),
            budget,
            persist,
        );
        let result = router
            .select_model(TaskType::ProposalGeneration, TokenCount::default(), false)
            .await
            .unwrap();
        assert_ne!(result.model_id, "local-llama3");

        let queued = rx.try_recv().unwrap();
        assert!(matches!(queued, PersistRequest::Budget(ref cfg) if cfg.daily_used == 0.0));
    }

    #[tokio::test]
    async fn test_update_budget_limits_persists() {
        use crate::storage::writer::PersistRequest;

        let (persist, mut rx) = PersistHandle::channel();
        let router = ModelRouter::new(
            ModelCatalog::builtin(),
            ProfileRegistry::builtin(),
            BudgetTracker::new(20.0, 300.0, Utc::now()),
            persist,
        );
        assert!(router.update_budget_limits(40.0, 600.0).await);
        let status = router.budget_status().await;
        assert_eq!(status.daily.limit, 40.0);
        assert_eq!(status.monthly.limit, 600.0);
        let queued = rx.try_recv().unwrap();
        assert!(matches!(queued, PersistRequest::Budget(ref cfg)
            if cfg.daily_limit == 40.0 && cfg.monthly_limit == 600.0));
    }
}
