/// Candidate source abstraction
///
/// Candidate sources turn a planned outfit slot (category + description, and an
/// embedding when the planner produced one) into a ranked list of priced products
/// with similarity scores. The optimizer does not care how they were produced.
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::RawCandidate,
};

pub mod catalog;
pub mod supabase;

pub use catalog::{CatalogProduct, CatalogSource};
pub use supabase::SupabaseSource;

/// One retrieval request for a single outfit category
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub category: String,
    pub description: String,
    pub embedding: Option<Vec<f32>>,
    /// Products above this price (major units) are not returned, `None` for no bound
    pub max_price: Option<f64>,
    /// Maximum number of candidates to return
    pub limit: usize,
    /// Minimum similarity for a candidate to be returned
    pub threshold: f64,
}

/// Trait for candidate sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch ranked candidates for one category
    ///
    /// An empty list is a valid answer; the caller decides whether that is fatal.
    async fn fetch_candidates(&self, query: &CandidateQuery) -> AppResult<Vec<RawCandidate>>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Fetches candidates for several categories in parallel
///
/// Results come back in query order. Unlike a best-effort batch, any failure
/// fails the whole batch: the outfit needs every category.
pub async fn fetch_candidates_batch(
    source: Arc<dyn CandidateSource>,
    queries: Vec<CandidateQuery>,
) -> AppResult<Vec<Vec<RawCandidate>>> {
    let mut tasks = Vec::with_capacity(queries.len());

    for query in queries {
        let source = Arc::clone(&source);
        let task = tokio::spawn(async move {
            let result = source.fetch_candidates(&query).await;
            (query.category, result)
        });
        tasks.push(task);
    }

    let mut results = Vec::with_capacity(tasks.len());

    for task in tasks {
        match task.await {
            Ok((category, Ok(candidates))) => {
                tracing::debug!(
                    category = %category,
                    candidates = candidates.len(),
                    "Candidates fetched"
                );
                results.push(candidates);
            }
            Ok((category, Err(e))) => {
                tracing::error!(category = %category, error = %e, "Candidate fetch failed");
                return Err(e);
            }
            Err(e) => {
                tracing::error!(error = %e, "Task join error");
                return Err(AppError::Internal(e.to_string()));
            }
        }
    }

    Ok(results)
}
