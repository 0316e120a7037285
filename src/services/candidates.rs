use std::collections::HashSet;

use crate::{
    error::AssemblyError,
    models::{Candidate, CandidateSet, CategoryCandidates, RawCandidate},
};

/// Minor currency units per major unit
pub const CENTS_PER_UNIT: f64 = 100.0;

/// Converts a major-unit amount to minor units, rounding half to even
pub fn to_cents(amount: f64) -> u64 {
    (amount * CENTS_PER_UNIT).round_ties_even() as u64
}

/// Converts minor units back to major units
pub fn from_cents(cents: u64) -> f64 {
    cents as f64 / CENTS_PER_UNIT
}

/// Validates a budget and converts it to the minor-unit ceiling
pub fn budget_to_cents(budget: f64) -> Result<u64, AssemblyError> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(AssemblyError::InvalidBudget(budget));
    }
    Ok(to_cents(budget))
}

/// Normalizes raw per-category candidates into candidate sets
///
/// Category order is preserved; it is the processing order for both scenarios.
pub fn build_candidate_sets(
    categories: Vec<CategoryCandidates>,
) -> Result<Vec<CandidateSet>, AssemblyError> {
    if categories.is_empty() {
        return Err(AssemblyError::NoCategories);
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut sets = Vec::with_capacity(categories.len());

    for CategoryCandidates {
        category,
        candidates,
    } in categories
    {
        if !seen.insert(category.clone()) {
            return Err(AssemblyError::DuplicateCategory(category));
        }

        if candidates.is_empty() {
            return Err(AssemblyError::MissingCandidates { category });
        }

        let candidates = candidates
            .into_iter()
            .enumerate()
            .map(|(index, raw)| normalize(&category, index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            category = %category,
            candidates = candidates.len(),
            "Built candidate set"
        );

        sets.push(CandidateSet {
            category,
            candidates,
        });
    }

    Ok(sets)
}

fn normalize(category: &str, index: usize, raw: RawCandidate) -> Result<Candidate, AssemblyError> {
    let invalid = |reason: String| AssemblyError::InvalidCandidate {
        category: category.to_string(),
        index,
        reason,
    };

    if !raw.price.is_finite() || raw.price < 0.0 {
        return Err(invalid(format!("price {} is not a non-negative amount", raw.price)));
    }
    if !raw.similarity.is_finite() || raw.similarity < 0.0 {
        return Err(invalid(format!(
            "similarity {} is not a non-negative number",
            raw.similarity
        )));
    }

    Ok(Candidate {
        cost_cents: to_cents(raw.price),
        similarity: raw.similarity,
        payload: raw.payload,
    })
}
