//! Model catalog - the registry of callable AI backends.
//!
//! Each entry pairs a stable identity (id, provider, cost rates, token limit)
//! with a mutable capability vector that the adaptive updater nudges toward
//! measured performance over time.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// AI provider a model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    Mistral,
    OpenRouter,
    /// Local deployment (zero-cost models).
    Ollama,
}

/// Coarse latency class of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyClass {
    Fast,
    Medium,
    Slow,
}

/// A capability dimension models are rated on.
///
/// The same dimensions are used as requirement weights in task profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CreativeWriting,
    TechnicalContent,
    Communication,
    Reasoning,
    DataAnalysis,
}

impl Capability {
    /// All dimensions, for iteration.
    pub const ALL: [Capability; 5] = [
        Capability::CreativeWriting,
        Capability::TechnicalContent,
        Capability::Communication,
        Capability::Reasoning,
        Capability::DataAnalysis,
    ];
}

/// A vector of per-dimension ratings in `[0, 1]` (or requirement weights,
/// when used by a task profile).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityVector {
    #[serde(default)]
    pub creative_writing: f64,
    #[serde(default)]
    pub technical_content: f64,
    #[serde(default)]
    pub communication: f64,
    #[serde(default)]
    pub reasoning: f64,
    #[serde(default)]
    pub data_analysis: f64,
}

impl CapabilityVector {
    pub fn new(
        creative_writing: f64,
        technical_content: f64,
        communication: f64,
        reasoning: f64,
        data_analysis: f64,
    ) -> Self {
        Self {
            creative_writing,
            technical_content,
            communication,
            reasoning,
            data_analysis,
        }
    }

    /// Get the rating for one dimension.
    pub fn get(&self, capability: Capability) -> f64 {
        match capability {
            Capability::CreativeWriting => self.creative_writing,
            Capability::TechnicalContent => self.technical_content,
            Capability::Communication => self.communication,
            Capability::Reasoning => self.reasoning,
            Capability::DataAnalysis => self.data_analysis,
        }
    }

    /// Set the rating for one dimension.
    pub fn set(&mut self, capability: Capability, value: f64) {
        let slot = match capability {
            Capability::CreativeWriting => &mut self.creative_writing,
            Capability::TechnicalContent => &mut self.technical_content,
            Capability::Communication => &mut self.communication,
            Capability::Reasoning => &mut self.reasoning,
            Capability::DataAnalysis => &mut self.data_analysis,
        };
        *slot = value;
    }
}

/// Cost rates per 1,000 tokens, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostPer1k {
    pub input: f64,
    pub output: f64,
}

impl CostPer1k {
    pub fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    /// Whether this model costs nothing to run (local deployment).
    pub fn is_free(&self) -> bool {
        self.input == 0.0 && self.output == 0.0
    }
}

/// A callable AI backend with its capability profile and cost structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub provider: Provider,
    pub capabilities: CapabilityVector,
    pub cost_per_1k: CostPer1k,
    /// Maximum context size in tokens.
    pub token_limit: u64,
    pub latency: LatencyClass,
    /// Informational priority tier; higher means preferred when budget allows.
    pub priority: u8,
}

impl Model {
    /// Estimated cost of a task in USD given a token estimate.
    pub fn estimated_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        input_tokens as f64 * self.cost_per_1k.input / 1000.0
            + output_tokens as f64 * self.cost_per_1k.output / 1000.0
    }
}

/// Registry of available models, keyed by model id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    models: HashMap<String, Model>,
}

impl ModelCatalog {
    /// Create a catalog from a list of models. Later duplicates win.
    pub fn new(models: impl IntoIterator<Item = Model>) -> Self {
        Self {
            models: models
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
        }
    }

    /// Load a catalog from a JSON file (a top-level array of models).
    ///
    /// Validates at load time so lookups never have to.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let models: Vec<Model> = serde_json::from_str(&contents)?;
        for model in &models {
            if model.cost_per_1k.input < 0.0 || model.cost_per_1k.output < 0.0 {
                anyhow::bail!("model {} has a negative cost rate", model.id);
            }
        }
        if models.is_empty() {
            anyhow::bail!("catalog file {} contains no models", path.display());
        }
        tracing::info!("Loaded {} models from {}", models.len(), path.display());
        Ok(Self::new(models))
    }

    /// Look up a model by id.
    pub fn get(&self, id: &str) -> Option<&Model> {
        self.models.get(id)
    }

    /// Whether a model id exists in the catalog.
    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    /// Iterate over all models (order unspecified).
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Update a model's capability vector in place.
    ///
    /// Unknown ids are a no-op (entries are never created implicitly).
    /// Returns whether the model existed.
    pub fn update_capabilities(
        &mut self,
        id: &str,
        update: impl FnOnce(&mut CapabilityVector),
    ) -> bool {
        match self.models.get_mut(id) {
            Some(model) => {
                update(&mut model.capabilities);
                true
            }
            None => false,
        }
    }

    /// The designated zero-cost local backend, if the catalog has one.
    ///
    /// Used as the hard fallback when no candidate survives the budget and
    /// quality filters.
    pub fn local_fallback(&self) -> Option<&Model> {
        self.models.values().find(|m| m.cost_per_1k.is_free())
    }

    /// The built-in model table with capability ratings.
    pub fn builtin() -> Self {
        let models = vec![
            Model {
                id: "gpt-4o".to_string(),
                provider: Provider::OpenAi,
                capabilities: CapabilityVector::new(0.95, 0.92, 0.94, 0.93, 0.88),
                cost_per_1k: CostPer1k::new(0.01, 0.03),
                token_limit: 128_000,
                latency: LatencyClass::Medium,
                priority: 3,
            },
            Model {
                id: "gpt-3.5-turbo".to_string(),
                provider: Provider::OpenAi,
                capabilities: CapabilityVector::new(0.82, 0.75, 0.85, 0.70, 0.65),
                cost_per_1k: CostPer1k::new(0.0005, 0.0015),
                token_limit: 16_000,
                latency: LatencyClass::Fast,
                priority: 1,
            },
            Model {
                id: "gemini-1.5-pro".to_string(),
                provider: Provider::Google,
                capabilities: CapabilityVector::new(0.88, 0.89, 0.86, 0.90, 0.85),
                cost_per_1k: CostPer1k::new(0.0025, 0.0075),
                token_limit: 1_000_000,
                latency: LatencyClass::Medium,
                priority: 2,
            },
            Model {
                id: "gemini-1.5-flash".to_string(),
                provider: Provider::Google,
                capabilities: CapabilityVector::new(0.82, 0.78, 0.80, 0.75, 0.70),
                cost_per_1k: CostPer1k::new(0.0005, 0.0015),
                token_limit: 1_000_000,
                latency: LatencyClass::Fast,
                priority: 1,
            },
            Model {
                id: "claude-3-opus".to_string(),
                provider: Provider::Anthropic,
                capabilities: CapabilityVector::new(0.91, 0.93, 0.94, 0.95, 0.88),
                cost_per_1k: CostPer1k::new(0.015, 0.075),
                token_limit: 200_000,
                latency: LatencyClass::Slow,
                priority: 3,
            },
            Model {
                id: "claude-3-sonnet".to_string(),
                provider: Provider::Anthropic,
                capabilities: CapabilityVector::new(0.90, 0.88, 0.92, 0.89, 0.83),
                cost_per_1k: CostPer1k::new(0.003, 0.015),
                token_limit: 200_000,
                latency: LatencyClass::Medium,
                priority: 2,
            },
            Model {
                id: "claude-3-haiku".to_string(),
                provider: Provider::Anthropic,
                capabilities: CapabilityVector::new(0.85, 0.80, 0.87, 0.78, 0.72),
                cost_per_1k: CostPer1k::new(0.00025, 0.00125),
                token_limit: 200_000,
                latency: LatencyClass::Fast,
                priority: 1,
            },
            Model {
                id: "mistral-large".to_string(),
                provider: Provider::Mistral,
                capabilities: CapabilityVector::new(0.87, 0.89, 0.86, 0.88, 0.82),
                cost_per_1k: CostPer1k::new(0.002, 0.006),
                token_limit: 32_000,
                latency: LatencyClass::Medium,
                priority: 2,
            },
            Model {
                id: "mistral-small".to_string(),
                provider: Provider::Mistral,
                capabilities: CapabilityVector::new(0.75, 0.78, 0.76, 0.74, 0.68),
                cost_per_1k: CostPer1k::new(0.0002, 0.0006),
                token_limit: 32_000,
                latency: LatencyClass::Fast,
                priority: 1,
            },
            // Local model for extremely cost-sensitive work; doubles as the
            // zero-cost hard fallback.
            Model {
                id: "local-llama3".to_string(),
                provider: Provider::Ollama,
                capabilities: CapabilityVector::new(0.65, 0.70, 0.60, 0.62, 0.55),
                cost_per_1k: CostPer1k::new(0.0, 0.0),
                token_limit: 8_000,
                latency: LatencyClass::Slow,
                priority: 0,
            },
        ];
        Self::new(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(catalog.len(), 10);
        assert!(catalog.contains("gpt-4o"));
        assert!(catalog.contains("local-llama3"));
        assert!(!catalog.contains("gpt-5"));
    }

    #[test]
    fn test_local_fallback_is_the_free_model() {
        let catalog = ModelCatalog::builtin();
        let fallback = catalog.local_fallback().expect("builtin has a local model");
        assert_eq!(fallback.id, "local-llama3");
        assert!(fallback.cost_per_1k.is_free());
    }

    #[test]
    fn test_estimated_cost() {
        let catalog = ModelCatalog::builtin();
        let model = catalog.get("gpt-4o").unwrap();
        // 500 in at 0.01/1k + 1500 out at 0.03/1k
        let cost = model.estimated_cost(500, 1500);
        assert!((cost - (0.005 + 0.045)).abs() < 1e-12);
    }

    #[test]
    fn test_update_capabilities_unknown_id_is_noop() {
        let mut catalog = ModelCatalog::builtin();
        let touched = catalog.update_capabilities("no-such-model", |caps| {
            caps.set(Capability::Reasoning, 1.0);
        });
        assert!(!touched);
        assert_eq!(catalog.len(), 10);
    }

    #[test]
    fn test_capability_vector_get_set() {
        let mut caps = CapabilityVector::default();
        for dim in Capability::ALL {
            assert_eq!(caps.get(dim), 0.0);
        }
        caps.set(Capability::Communication, 0.8);
        assert_eq!(caps.get(Capability::Communication), 0.8);
        assert_eq!(caps.get(Capability::Reasoning), 0.0);
    }
}
