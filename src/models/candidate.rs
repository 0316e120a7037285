use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

/// Identifier of a catalog product
///
/// Catalogs differ on whether product ids are numeric or textual, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Numeric(i64),
    Text(String),
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductId::Numeric(id) => write!(f, "{}", id),
            ProductId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// Descriptive product fields carried through the optimizer untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_link: Option<String>,
    /// Any other field returned by the candidate source, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Candidate record as returned by a candidate source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    /// Price in major currency units (e.g. 19.99)
    pub price: f64,
    /// Relevance of the product to the requested item
    pub similarity: f64,
    #[serde(flatten)]
    pub payload: ProductPayload,
}

impl RawCandidate {
    pub fn new(price: f64, similarity: f64, payload: ProductPayload) -> Self {
        Self {
            price,
            similarity,
            payload,
        }
    }
}

/// Normalized candidate used by the optimizer
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Price in minor currency units (cents)
    pub cost_cents: u64,
    pub similarity: f64,
    pub payload: ProductPayload,
}

/// Ordered candidates for one outfit category
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    pub category: String,
    pub candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// Highest candidate cost in this category, 0 when empty
    pub fn max_cost_cents(&self) -> u64 {
        self.candidates
            .iter()
            .map(|c| c.cost_cents)
            .max()
            .unwrap_or(0)
    }
}

/// Raw candidates for one category, as supplied by a caller or a candidate source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCandidates {
    pub category: String,
    pub candidates: Vec<RawCandidate>,
}
