use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::OutfitService,
};

pub mod outfit;

/// Shared application state
pub struct AppState {
    pub outfit_service: Arc<OutfitService>,
}

impl AppState {
    pub fn new(outfit_service: OutfitService) -> Self {
        Self {
            outfit_service: Arc::new(outfit_service),
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/outfit", post(outfit::recommend))
        .route("/outfit/assemble", post(outfit::assemble))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::services::{providers::CatalogSource, AssemblySettings};

    fn app() -> Router {
        let service = OutfitService::new(
            Arc::new(CatalogSource::default()),
            AssemblySettings::default(),
        );
        create_router(Arc::new(AppState::new(service)))
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let request = Request::post("/api/v1/outfit/assemble")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"budget": "a lot"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(Request::get("/api/v1/titles").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
