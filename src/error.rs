use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::knapsack::KnapsackError;

/// Errors raised while turning candidate lists into an outfit
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("Missing candidates for category {category}")]
    MissingCandidates { category: String },

    #[error("Invalid candidate #{index} in category {category}: {reason}")]
    InvalidCandidate {
        category: String,
        index: usize,
        reason: String,
    },

    #[error("Category {0} was requested more than once")]
    DuplicateCategory(String),

    #[error("At least one category is required")]
    NoCategories,

    #[error("Invalid budget {0}: must be a finite, non-negative amount")]
    InvalidBudget(f64),

    #[error(transparent)]
    Knapsack(#[from] KnapsackError),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Assembly(err) => match err {
                AssemblyError::MissingCandidates { .. }
                | AssemblyError::Knapsack(KnapsackError::Infeasible { .. }) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AssemblyError::Knapsack(KnapsackError::BrokenPath { .. }) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::ExternalApi(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::InvalidInput(msg) | AppError::ExternalApi(msg) => msg.clone(),
            AppError::Assembly(err) => err.to_string(),
            AppError::HttpClient(_) | AppError::Internal(_) => self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
