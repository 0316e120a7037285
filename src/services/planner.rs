use crate::{
    error::AssemblyError,
    models::CandidateSet,
    services::knapsack::{Item, KnapsackEngine, KnapsackError, Selection, SkipPolicy, TableLimits},
};

/// Tunables for the two assembly scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerSettings {
    pub limits: TableLimits,
    /// Headroom added to the synthetic full-outfit ceiling, in minor units
    pub full_outfit_margin_cents: u64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            limits: TableLimits::default(),
            full_outfit_margin_cents: 100,
        }
    }
}

/// Raw selections for both scenarios, indexed like the candidate sets they came from
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedOutfit {
    /// Budget-respecting selection, categories may be skipped
    pub feasible: Selection,
    /// Best complete outfit ignoring the budget
    pub full_outfit: Result<Selection, KnapsackError>,
}

/// Runs the knapsack engine once per scenario over the same candidate sets
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioPlanner {
    engine: KnapsackEngine,
    full_outfit_margin_cents: u64,
}

impl ScenarioPlanner {
    pub fn new(settings: PlannerSettings) -> Self {
        Self {
            engine: KnapsackEngine::new(settings.limits),
            full_outfit_margin_cents: settings.full_outfit_margin_cents,
        }
    }

    /// Ceiling large enough for the most expensive candidate of every category
    pub fn full_outfit_ceiling(&self, sets: &[CandidateSet], budget_cents: u64) -> u64 {
        sets.iter()
            .map(CandidateSet::max_cost_cents)
            .fold(0u64, u64::saturating_add)
            .saturating_add(budget_cents)
            .saturating_add(self.full_outfit_margin_cents)
    }

    /// Plans the feasible and the full-outfit scenarios
    ///
    /// Only the feasible scenario can fail the call; a failed full outfit is
    /// reported inside the returned plan.
    pub fn plan(
        &self,
        sets: &[CandidateSet],
        budget_cents: u64,
    ) -> Result<PlannedOutfit, AssemblyError> {
        let columns: Vec<Vec<Item>> = sets
            .iter()
            .map(|set| {
                set.candidates
                    .iter()
                    .map(|c| Item::new(c.cost_cents, c.similarity))
                    .collect()
            })
            .collect();

        let feasible = self
            .engine
            .solve(&columns, budget_cents, SkipPolicy::Allow)?;

        tracing::info!(
            ceiling = budget_cents,
            chosen = feasible.chosen_count(),
            categories = sets.len(),
            total_cost_cents = feasible.total_cost,
            "Feasible outfit planned"
        );

        let full_ceiling = self.full_outfit_ceiling(sets, budget_cents);
        let full_outfit = self
            .engine
            .solve(&columns, full_ceiling, SkipPolicy::Forbid);

        match &full_outfit {
            Ok(selection) => tracing::info!(
                ceiling = full_ceiling,
                total_cost_cents = selection.total_cost,
                "Full outfit planned"
            ),
            Err(e) => tracing::warn!(
                ceiling = full_ceiling,
                error = %e,
                "Full outfit could not be planned"
            ),
        }

        Ok(PlannedOutfit {
            feasible,
            full_outfit,
        })
    }
}
