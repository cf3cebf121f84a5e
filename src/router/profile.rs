//! Task profiles - requirement vectors and quality policy per task category.
//!
//! Task types are a closed enumeration validated at the string boundary, so
//! profile lookup itself is infallible.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::catalog::CapabilityVector;
use super::error::RouterError;

/// Category of work the router can be asked to staff a model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    JobFiltering,
    ProposalGeneration,
    ClientCommunication,
    ProjectPlanning,
    CostOptimization,
}

impl TaskType {
    /// All task types, for iteration.
    pub const ALL: [TaskType; 5] = [
        TaskType::JobFiltering,
        TaskType::ProposalGeneration,
        TaskType::ClientCommunication,
        TaskType::ProjectPlanning,
        TaskType::CostOptimization,
    ];

    /// Stable wire name (snake_case).
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::JobFiltering => "job_filtering",
            TaskType::ProposalGeneration => "proposal_generation",
            TaskType::ClientCommunication => "client_communication",
            TaskType::ProjectPlanning => "project_planning",
            TaskType::CostOptimization => "cost_optimization",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = RouterError;

    /// Parse a task type name, case-insensitively.
    ///
    /// Unknown names fail with [`RouterError::UnknownTaskType`] before any
    /// budget state is touched.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "job_filtering" => Ok(TaskType::JobFiltering),
            "proposal_generation" => Ok(TaskType::ProposalGeneration),
            "client_communication" => Ok(TaskType::ClientCommunication),
            "project_planning" => Ok(TaskType::ProjectPlanning),
            "cost_optimization" => Ok(TaskType::CostOptimization),
            _ => Err(RouterError::UnknownTaskType(s.to_string())),
        }
    }
}

/// Weighted requirements and quality policy for one task category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProfile {
    pub name: String,
    pub description: String,
    /// Per-dimension requirement weights (>= 0).
    pub requirements: CapabilityVector,
    /// Floor applied only during the relaxed retry and the scarcity branch.
    pub min_acceptable_score: f64,
    /// Default acceptance floor for candidates.
    pub quality_threshold: f64,
    pub prioritize_cost: bool,
    pub prioritize_speed: bool,
}

/// Total map from task type to profile: one slot per variant, so lookup is
/// a plain match and cannot fail.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    job_filtering: TaskProfile,
    proposal_generation: TaskProfile,
    client_communication: TaskProfile,
    project_planning: TaskProfile,
    cost_optimization: TaskProfile,
}

impl ProfileRegistry {
    /// Look up the profile for a task type.
    pub fn get(&self, task_type: TaskType) -> &TaskProfile {
        match task_type {
            TaskType::JobFiltering => &self.job_filtering,
            TaskType::ProposalGeneration => &self.proposal_generation,
            TaskType::ClientCommunication => &self.client_communication,
            TaskType::ProjectPlanning => &self.project_planning,
            TaskType::CostOptimization => &self.cost_optimization,
        }
    }

    /// Iterate over all (type, profile) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (TaskType, &TaskProfile)> {
        TaskType::ALL.into_iter().map(|t| (t, self.get(t)))
    }

    /// The built-in profile table.
    pub fn builtin() -> Self {
        Self {
            job_filtering: TaskProfile {
                name: "Initial job filtering".to_string(),
                description: "Fast scanning and filtering of job postings".to_string(),
                requirements: CapabilityVector::new(0.1, 0.6, 0.2, 0.7, 0.5),
                min_acceptable_score: 0.6,
                quality_threshold: 0.65,
                prioritize_cost: true,
                prioritize_speed: true,
            },
            proposal_generation: TaskProfile {
                name: "Proposal generation".to_string(),
                description: "Personalized, persuasive proposals".to_string(),
                requirements: CapabilityVector::new(0.9, 0.7, 0.9, 0.7, 0.3),
                min_acceptable_score: 0.8,
                quality_threshold: 0.85,
                prioritize_cost: false,
                prioritize_speed: false,
            },
            client_communication: TaskProfile {
                name: "Client communication".to_string(),
                description: "Professional emails and messages".to_string(),
                requirements: CapabilityVector::new(0.6, 0.4, 0.9, 0.7, 0.2),
                min_acceptable_score: 0.75,
                quality_threshold: 0.8,
                prioritize_cost: false,
                prioritize_speed: true,
            },
            project_planning: TaskProfile {
                name: "Project planning".to_string(),
                description: "Schedules, milestones and resource planning".to_string(),
                requirements: CapabilityVector::new(0.3, 0.7, 0.6, 0.9, 0.8),
                min_acceptable_score: 0.75,
                quality_threshold: 0.75,
                prioritize_cost: false,
                prioritize_speed: false,
            },
            cost_optimization: TaskProfile {
                name: "Cost optimization".to_string(),
                description: "Budget analyses and optimization suggestions".to_string(),
                requirements: CapabilityVector::new(0.2, 0.6, 0.5, 0.8, 0.9),
                min_acceptable_score: 0.7,
                quality_threshold: 0.7,
                prioritize_cost: true,
                prioritize_speed: false,
            },
        }
    }
}
