/// In-memory catalog candidate source
///
/// Holds products with precomputed embeddings and ranks them by cosine similarity
/// against the query embedding. Useful for local runs and tests without a vector
/// database.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{ProductPayload, RawCandidate},
    services::providers::{CandidateQuery, CandidateSource},
};

/// A catalog entry with its image/text embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub category: String,
    /// Price in major currency units
    pub price: f64,
    pub embedding: Vec<f32>,
    #[serde(flatten)]
    pub payload: ProductPayload,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogSource {
    products: Vec<CatalogProduct>,
}

impl CatalogSource {
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self { products }
    }

    /// Loads a catalog from a JSON array of products
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read catalog {}: {}", path.display(), e))?;
        let products: Vec<CatalogProduct> = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse catalog {}: {}", path.display(), e))?;

        tracing::info!(
            path = %path.display(),
            products = products.len(),
            "Loaded product catalog"
        );

        Ok(Self::new(products))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Cosine similarity of two vectors of equal length, 0 when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait::async_trait]
impl CandidateSource for CatalogSource {
    async fn fetch_candidates(&self, query: &CandidateQuery) -> AppResult<Vec<RawCandidate>> {
        let embedding = query.embedding.as_deref().ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Catalog search for category {} requires a query embedding",
                query.category
            ))
        })?;

        let threshold = query.threshold.max(0.0);
        let mut scored: Vec<(f64, &CatalogProduct)> = Vec::new();

        for product in self.products.iter().filter(|p| p.category == query.category) {
            if product.embedding.len() != embedding.len() {
                return Err(AppError::InvalidInput(format!(
                    "Query embedding has {} dimensions, catalog uses {}",
                    embedding.len(),
                    product.embedding.len()
                )));
            }
            if query.max_price.is_some_and(|max| product.price > max) {
                continue;
            }

            let similarity = cosine_similarity(embedding, &product.embedding);
            if similarity >= threshold {
                scored.push((similarity, product));
            }
        }

        // Stable sort keeps catalog order among equal scores
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(query.limit);

        tracing::debug!(
            category = %query.category,
            matches = scored.len(),
            "Catalog search completed"
        );

        Ok(scored
            .into_iter()
            .map(|(similarity, product)| {
                RawCandidate::new(product.price, similarity, product.payload.clone())
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}
