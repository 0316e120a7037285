use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CategoryCandidates, ProductId};

// ============================================================================
// Requests
// ============================================================================

/// One planned outfit slot: what the user wants for a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRequest {
    pub category: String,
    pub description: String,
    /// Query embedding computed by the planning front-end, if any
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// Request to retrieve candidates for a planned outfit and assemble it
#[derive(Debug, Clone, Deserialize)]
pub struct OutfitRequest {
    /// Budget in major currency units
    pub budget: f64,
    pub items: Vec<ItemRequest>,
}

/// Request to assemble an outfit from caller-supplied candidates
#[derive(Debug, Clone, Deserialize)]
pub struct AssembleRequest {
    /// Budget in major currency units
    pub budget: f64,
    /// Categories in processing order
    pub categories: Vec<CategoryCandidates>,
}

// ============================================================================
// Responses
// ============================================================================

/// A chosen product, formatted for the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitItem {
    pub category: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub id: Option<ProductId>,
    /// Rounded to 4 decimal places
    pub similarity: f64,
    pub image_link: Option<String>,
    /// Price in major currency units
    pub price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of one assembly scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Chosen items in category order
    pub items: Vec<OutfitItem>,
    /// Categories left unfilled (only possible when skipping is allowed)
    pub skipped_categories: Vec<String>,
    /// Total cost in major currency units
    pub total_cost: f64,
    pub total_cost_cents: u64,
    /// Sum of the chosen similarities, rounded to 4 decimal places
    pub total_similarity: f64,
    /// Budget minus total cost; negative when the outfit exceeds the budget
    pub remaining_budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Assembled(ScenarioResult),
    Failed { reason: String },
}

impl ScenarioOutcome {
    pub fn assembled(&self) -> Option<&ScenarioResult> {
        match self {
            ScenarioOutcome::Assembled(result) => Some(result),
            ScenarioOutcome::Failed { .. } => None,
        }
    }
}

/// How well the budget-respecting outfit covers the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutfitStatus {
    /// Every category is filled within budget
    Complete,
    /// Some categories had to be skipped to stay within budget
    Partial,
    /// Nothing fits the budget; only the full outfit suggestion is available
    NothingAffordable,
}

/// Per-call timing figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyTimings {
    pub retrieval_ms: u64,
    pub assembly_ms: u64,
}

/// Response with the budget-respecting outfit and the best full outfit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitResponse {
    pub budget: f64,
    pub status: OutfitStatus,
    /// Best outfit within budget, categories may be skipped
    pub feasible: ScenarioOutcome,
    /// Best complete outfit regardless of budget
    pub full_outfit: ScenarioOutcome,
    /// How far the full outfit exceeds the budget, if it does
    pub over_budget_by: Option<f64>,
    pub timings: AssemblyTimings,
    pub generated_at: DateTime<Utc>,
}
