use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{AssembleRequest, OutfitRequest, OutfitResponse},
    routes::AppState,
};

/// Handler for the outfit recommendation endpoint
///
/// Retrieves candidates for each planned item, then assembles the outfit.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<OutfitRequest>,
) -> AppResult<Json<OutfitResponse>> {
    tracing::info!(
        request_id = %request_id,
        items = request.items.len(),
        budget = request.budget,
        "Processing outfit request"
    );

    let response = state.outfit_service.recommend(request).await?;

    tracing::info!(
        request_id = %request_id,
        status = ?response.status,
        retrieval_ms = response.timings.retrieval_ms,
        assembly_ms = response.timings.assembly_ms,
        "Outfit request completed"
    );

    Ok(Json(response))
}

/// Handler for assembling an outfit from caller-supplied candidates
pub async fn assemble(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<AssembleRequest>,
) -> AppResult<Json<OutfitResponse>> {
    tracing::info!(
        request_id = %request_id,
        categories = request.categories.len(),
        budget = request.budget,
        "Processing assembly request"
    );

    let response = state.outfit_service.assemble_async(request).await?;

    tracing::info!(
        request_id = %request_id,
        status = ?response.status,
        assembly_ms = response.timings.assembly_ms,
        "Assembly request completed"
    );

    Ok(Json(response))
}
