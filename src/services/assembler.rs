use chrono::Utc;
use serde_json::{Map, Value};

use crate::{
    models::{
        AssemblyTimings, CandidateSet, OutfitItem, OutfitResponse, OutfitStatus, ScenarioOutcome,
        ScenarioResult,
    },
    services::{
        candidates::{from_cents, to_cents},
        knapsack::Selection,
        planner::PlannedOutfit,
    },
};

/// Keys of [`OutfitItem`] that pass-through product fields must not shadow
const RESERVED_ITEM_KEYS: [&str; 7] = [
    "category",
    "title",
    "url",
    "id",
    "similarity",
    "image_link",
    "price",
];

/// Rounds a similarity for display, the way it is printed with four decimals
pub fn round_similarity(value: f64) -> f64 {
    format!("{:.4}", value).parse().unwrap_or(value)
}

/// Turns a selection into caller-facing records
///
/// `sets` must be the candidate sets the selection was computed from.
pub fn scenario_result(
    sets: &[CandidateSet],
    budget: f64,
    selection: &Selection,
) -> ScenarioResult {
    let mut items = Vec::with_capacity(selection.chosen_count());
    let mut skipped_categories = Vec::new();

    for (set, pick) in sets.iter().zip(&selection.picks) {
        let Some(candidate) = pick.and_then(|index| set.candidates.get(index)) else {
            skipped_categories.push(set.category.clone());
            continue;
        };

        let payload = &candidate.payload;
        items.push(OutfitItem {
            category: set.category.clone(),
            title: payload.title.clone(),
            url: payload.url.clone(),
            id: payload.id.clone(),
            similarity: round_similarity(candidate.similarity),
            image_link: payload.image_link.clone(),
            price: from_cents(candidate.cost_cents),
            extra: passthrough_fields(&payload.extra),
        });
    }

    let total_cost = from_cents(selection.total_cost);

    ScenarioResult {
        items,
        skipped_categories,
        total_cost,
        total_cost_cents: selection.total_cost,
        total_similarity: round_similarity(selection.total_similarity),
        remaining_budget: budget - total_cost,
    }
}

/// Product fields forwarded as-is, minus the ones the item sets itself
fn passthrough_fields(extra: &Map<String, Value>) -> Map<String, Value> {
    extra
        .iter()
        .filter(|(key, _)| !RESERVED_ITEM_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Classifies how much of the request fits the budget
pub fn outfit_status(selection: &Selection) -> OutfitStatus {
    match selection.chosen_count() {
        0 => OutfitStatus::NothingAffordable,
        n if n == selection.picks.len() => OutfitStatus::Complete,
        _ => OutfitStatus::Partial,
    }
}

/// Builds the response carrying both scenarios
///
/// Both scenarios are always returned, even when the feasible outfit is empty;
/// presenting them is up to the caller.
pub fn assemble_response(
    sets: &[CandidateSet],
    budget: f64,
    plan: &PlannedOutfit,
    timings: AssemblyTimings,
) -> OutfitResponse {
    let feasible = scenario_result(sets, budget, &plan.feasible);
    let status = outfit_status(&plan.feasible);

    let (full_outfit, over_budget_by) = match &plan.full_outfit {
        Ok(selection) => {
            let budget_cents = to_cents(budget);
            let over_budget_by = (selection.total_cost > budget_cents)
                .then(|| from_cents(selection.total_cost - budget_cents));
            (
                ScenarioOutcome::Assembled(scenario_result(sets, budget, selection)),
                over_budget_by,
            )
        }
        Err(e) => (
            ScenarioOutcome::Failed {
                reason: e.to_string(),
            },
            None,
        ),
    };

    tracing::info!(
        status = ?status,
        feasible_items = feasible.items.len(),
        skipped = feasible.skipped_categories.len(),
        remaining_budget = feasible.remaining_budget,
        over_budget_by = ?over_budget_by,
        "Outfit assembled"
    );

    OutfitResponse {
        budget,
        status,
        feasible: ScenarioOutcome::Assembled(feasible),
        full_outfit,
        over_budget_by,
        timings,
        generated_at: Utc::now(),
    }
}
