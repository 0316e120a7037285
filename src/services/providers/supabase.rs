/// Supabase vector-search candidate source
///
/// Calls the `search_outfits` PostgreSQL function through PostgREST. The function
/// ranks catalog products of one category by embedding similarity and returns
/// product rows that already carry a `similarity` column.
///
/// API Flow:
/// 1. POST /rest/v1/rpc/search_outfits with the query embedding and filters
/// 2. Rows → RawCandidate (price, similarity, pass-through product fields)
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::RawCandidate,
    services::providers::{CandidateQuery, CandidateSource},
};

const RPC_FUNCTION: &str = "search_outfits";
const RETRY_BACKOFF_MS: u64 = 250;
/// `search_outfits` always filters on price, this stands in for "no bound"
const UNBOUNDED_PRICE: f64 = f64::MAX;

#[derive(Clone)]
pub struct SupabaseSource {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
    max_retries: u32,
}

/// Parameters of the `search_outfits` function
#[derive(Debug, Serialize)]
struct SearchOutfitsParams<'a> {
    query_embedding: &'a [f32],
    match_threshold: f64,
    match_count: usize,
    category_in: &'a str,
    max_espense: f64,
}

impl SupabaseSource {
    pub fn new(api_url: String, api_key: String, max_retries: u32) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries,
        }
    }

    fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.api_url, RPC_FUNCTION)
    }

    /// Single RPC round trip
    async fn call_rpc(
        &self,
        params: &SearchOutfitsParams<'_>,
    ) -> Result<Vec<RawCandidate>, RpcError> {
        let response = self
            .http_client
            .post(self.rpc_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError {
                retryable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
                error: AppError::ExternalApi(format!(
                    "Supabase RPC {} returned status {}: {}",
                    RPC_FUNCTION, status, body
                )),
            });
        }

        let rows: Vec<RawCandidate> = response.json().await?;
        Ok(rows)
    }
}

/// Failed RPC attempt and whether another attempt may succeed
struct RpcError {
    error: AppError,
    retryable: bool,
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            retryable: e.is_timeout() || e.is_connect(),
            error: AppError::HttpClient(e),
        }
    }
}

/// Drops rows the optimizer cannot use (negative or non-finite similarity)
fn usable_rows(rows: Vec<RawCandidate>) -> Vec<RawCandidate> {
    let total = rows.len();
    let usable: Vec<RawCandidate> = rows
        .into_iter()
        .filter(|row| row.similarity.is_finite() && row.similarity >= 0.0)
        .collect();

    if usable.len() < total {
        tracing::debug!(
            dropped = total - usable.len(),
            "Dropped rows with negative similarity"
        );
    }

    usable
}

#[async_trait::async_trait]
impl CandidateSource for SupabaseSource {
    async fn fetch_candidates(&self, query: &CandidateQuery) -> AppResult<Vec<RawCandidate>> {
        let embedding = query.embedding.as_deref().ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Vector search for category {} requires a query embedding",
                query.category
            ))
        })?;

        let params = SearchOutfitsParams {
            query_embedding: embedding,
            match_threshold: query.threshold,
            match_count: query.limit,
            category_in: &query.category,
            max_espense: query.max_price.unwrap_or(UNBOUNDED_PRICE),
        };

        let mut attempt = 0;
        loop {
            match self.call_rpc(&params).await {
                Ok(rows) => {
                    tracing::info!(
                        category = %query.category,
                        results = rows.len(),
                        attempt,
                        "Supabase vector search completed"
                    );
                    return Ok(usable_rows(rows));
                }
                Err(RpcError {
                    error,
                    retryable: true,
                }) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        category = %query.category,
                        attempt,
                        error = %error,
                        "Supabase vector search failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * u64::from(attempt)))
                        .await;
                }
                Err(RpcError { error, .. }) => return Err(error),
            }
        }
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductId;

    fn create_test_source() -> SupabaseSource {
        SupabaseSource::new(
            "https://project.supabase.co/".to_string(),
            "test_key".to_string(),
            2,
        )
    }

    #[test]
    fn test_rpc_url_trims_trailing_slash() {
        let source = create_test_source();
        assert_eq!(
            source.rpc_url(),
            "https://project.supabase.co/rest/v1/rpc/search_outfits"
        );
    }

    #[test]
    fn test_params_serialization() {
        let embedding = [0.25f32, -0.5];
        let params = SearchOutfitsParams {
            query_embedding: &embedding,
            match_threshold: 0.0,
            match_count: 10,
            category_in: "shoes",
            max_espense: 45.0,
        };

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["query_embedding"][0], 0.25);
        assert_eq!(value["match_count"], 10);
        assert_eq!(value["category_in"], "shoes");
        assert_eq!(value["max_espense"], 45.0);
    }

    #[test]
    fn test_rpc_row_deserialization() {
        let json = r#"[{
            "id": 981,
            "title": "Leather loafers",
            "url": "https://shop.example/loafers",
            "image_link": "https://cdn.example/loafers.jpg",
            "price": 89.9,
            "main_category": "shoes",
            "similarity": 0.3127
        }]"#;

        let rows: Vec<RawCandidate> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, 89.9);
        assert_eq!(rows[0].similarity, 0.3127);
        assert_eq!(rows[0].payload.id, Some(ProductId::Numeric(981)));
        assert_eq!(rows[0].payload.extra["main_category"], "shoes");
    }

    #[test]
    fn test_usable_rows_drops_negative_similarity() {
        let rows: Vec<RawCandidate> = serde_json::from_str(
            r#"[{"price": 10.0, "similarity": 0.4}, {"price": 12.0, "similarity": -0.2}]"#,
        )
        .unwrap();

        let usable = usable_rows(rows);

        assert_eq!(usable.len(), 1);
        assert_eq!(usable[0].similarity, 0.4);
    }

    #[tokio::test]
    async fn test_missing_embedding_is_invalid_input() {
        let source = create_test_source();
        let query = CandidateQuery {
            category: "shoes".to_string(),
            description: "leather loafers".to_string(),
            embedding: None,
            max_price: None,
            limit: 10,
            threshold: 0.0,
        };

        let result = source.fetch_candidates(&query).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
