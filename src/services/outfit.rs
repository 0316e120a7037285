use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult, AssemblyError},
    models::{
        AssembleRequest, AssemblyTimings, CategoryCandidates, OutfitRequest, OutfitResponse,
    },
    services::{
        assembler,
        candidates::{budget_to_cents, build_candidate_sets},
        planner::{PlannerSettings, ScenarioPlanner},
        providers::{fetch_candidates_batch, CandidateQuery, CandidateSource},
    },
};

/// Settings for retrieval and assembly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblySettings {
    pub planner: PlannerSettings,
    /// How many candidates to request per category
    pub candidates_per_category: usize,
    /// Minimum similarity passed to the candidate source
    pub match_threshold: f64,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            planner: PlannerSettings::default(),
            candidates_per_category: 10,
            match_threshold: 0.0,
        }
    }
}

/// Retrieves candidates for planned outfits and assembles them under a budget
pub struct OutfitService {
    source: Arc<dyn CandidateSource>,
    planner: ScenarioPlanner,
    settings: AssemblySettings,
}

impl OutfitService {
    pub fn new(source: Arc<dyn CandidateSource>, settings: AssemblySettings) -> Self {
        Self {
            source,
            planner: ScenarioPlanner::new(settings.planner),
            settings,
        }
    }

    /// Fetches candidates for every requested item, then assembles the outfit
    ///
    /// Retrieval is not bounded by the budget: the feasible scenario enforces
    /// the budget itself, and the full outfit may go over it.
    pub async fn recommend(&self, request: OutfitRequest) -> AppResult<OutfitResponse> {
        let start = Instant::now();

        budget_to_cents(request.budget)?;
        if request.items.is_empty() {
            return Err(AssemblyError::NoCategories.into());
        }
        if let Some(item) = request
            .items
            .iter()
            .find(|item| item.category.trim().is_empty())
        {
            return Err(AppError::InvalidInput(format!(
                "Item \"{}\" has no category",
                item.description
            )));
        }

        tracing::info!(
            source = self.source.name(),
            items = request.items.len(),
            budget = request.budget,
            "Retrieving outfit candidates"
        );

        let queries: Vec<CandidateQuery> = request
            .items
            .into_iter()
            .map(|item| CandidateQuery {
                category: item.category,
                description: item.description,
                embedding: item.embedding,
                max_price: None,
                limit: self.settings.candidates_per_category,
                threshold: self.settings.match_threshold,
            })
            .collect();
        let categories: Vec<String> = queries.iter().map(|q| q.category.clone()).collect();

        let fetched = fetch_candidates_batch(Arc::clone(&self.source), queries).await?;
        let retrieval_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            categories = categories.len(),
            retrieval_ms,
            "Candidates retrieved"
        );

        let categories = categories
            .into_iter()
            .zip(fetched)
            .map(|(category, candidates)| CategoryCandidates {
                category,
                candidates,
            })
            .collect();

        let mut response = self
            .assemble_async(AssembleRequest {
                budget: request.budget,
                categories,
            })
            .await?;
        response.timings.retrieval_ms = retrieval_ms;

        Ok(response)
    }

    /// Assembles an outfit from caller-supplied candidates
    pub fn assemble(&self, request: AssembleRequest) -> AppResult<OutfitResponse> {
        assemble_with(&self.planner, request)
    }

    /// Same as [`OutfitService::assemble`], run on the blocking thread pool
    ///
    /// Large budgets make the DP tables big enough to stall an async worker.
    pub async fn assemble_async(&self, request: AssembleRequest) -> AppResult<OutfitResponse> {
        let planner = self.planner;
        tokio::task::spawn_blocking(move || assemble_with(&planner, request))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn assemble_with(planner: &ScenarioPlanner, request: AssembleRequest) -> AppResult<OutfitResponse> {
    let start = Instant::now();

    let budget_cents = budget_to_cents(request.budget)?;
    let sets = build_candidate_sets(request.categories)?;
    let plan = planner.plan(&sets, budget_cents)?;

    let timings = AssemblyTimings {
        retrieval_ms: 0,
        assembly_ms: start.elapsed().as_millis() as u64,
    };

    Ok(assembler::assemble_response(
        &sets,
        request.budget,
        &plan,
        timings,
    ))
}
