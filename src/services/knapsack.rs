use thiserror::Error;

/// Error types for the knapsack engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KnapsackError {
    #[error("No categories to assemble")]
    NoColumns,
    #[error("Category at position {index} has no candidates")]
    EmptyColumn { index: usize },
    #[error("Category at position {index} has too many candidates ({len})")]
    ColumnTooLarge { index: usize, len: usize },
    #[error(
        "Cost ceiling of {ceiling} cents needs {cells} table cells, above the limit of \
         {max_ceiling} cents or {max_cells} cells"
    )]
    CeilingOverflow {
        ceiling: u64,
        cells: u64,
        max_ceiling: u64,
        max_cells: u64,
    },
    #[error("No feasible combination within {ceiling} cents")]
    Infeasible { ceiling: u64 },
    #[error("Traceback found no recorded choice for category {column} at cost {cost}")]
    BrokenPath { column: usize, cost: u64 },
}

/// A priced, scored option in one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    /// Cost in minor currency units
    pub cost: u64,
    pub similarity: f64,
}

impl Item {
    pub fn new(cost: u64, similarity: f64) -> Self {
        Self { cost, similarity }
    }
}

/// Whether a column may be left without a chosen item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipPolicy {
    /// A zero-cost, zero-similarity skip option is tried first in every column
    Allow,
    /// Every column must contribute exactly one item
    Forbid,
}

/// Upper bounds on the working tables of a single solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLimits {
    /// Largest accepted cost ceiling, in minor units
    pub max_ceiling: u64,
    /// Largest accepted path table, `(columns + 1) * (ceiling + 1)`
    pub max_cells: u64,
}

impl Default for TableLimits {
    fn default() -> Self {
        Self {
            max_ceiling: 2_000_000,
            max_cells: 16_000_000,
        }
    }
}

/// Optimal choice of at most one item per column
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Chosen item index per column, `None` when the column was skipped
    pub picks: Vec<Option<usize>>,
    /// Total cost in minor units
    pub total_cost: u64,
    /// Sum of the chosen similarities, accumulated in column order
    pub total_similarity: f64,
}

impl Selection {
    /// Number of columns that received an item
    pub fn chosen_count(&self) -> usize {
        self.picks.iter().filter(|pick| pick.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.chosen_count() == 0
    }
}

/// Path table entry: what produced the best value at a given (column, cost)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pick {
    Skip,
    Candidate(u32),
}

/// Multi-choice knapsack solver maximizing total similarity under a cost ceiling
///
/// The engine holds no state between calls; all tables are allocated per solve
/// and dropped on return, so one engine can serve concurrent requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnapsackEngine {
    limits: TableLimits,
}

impl KnapsackEngine {
    pub fn new(limits: TableLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> TableLimits {
        self.limits
    }

    /// Rejects ceilings whose tables would exceed the configured limits
    pub fn check_ceiling(&self, columns: usize, ceiling: u64) -> Result<(), KnapsackError> {
        let cells = (columns as u64)
            .saturating_add(1)
            .saturating_mul(ceiling.saturating_add(1));

        if ceiling > self.limits.max_ceiling || cells > self.limits.max_cells {
            return Err(KnapsackError::CeilingOverflow {
                ceiling,
                cells,
                max_ceiling: self.limits.max_ceiling,
                max_cells: self.limits.max_cells,
            });
        }

        Ok(())
    }

    /// Finds the maximum-similarity selection with total cost <= `ceiling`
    ///
    /// Ties are resolved deterministically:
    /// - at equal cost, the first option in iteration order (skip, then
    ///   candidates in input order) keeps the slot;
    /// - at equal similarity across costs, the highest cost wins.
    pub fn solve(
        &self,
        columns: &[Vec<Item>],
        ceiling: u64,
        skip: SkipPolicy,
    ) -> Result<Selection, KnapsackError> {
        if columns.is_empty() {
            return Err(KnapsackError::NoColumns);
        }

        for (index, column) in columns.iter().enumerate() {
            if column.is_empty() {
                return Err(KnapsackError::EmptyColumn { index });
            }
            if u32::try_from(column.len()).is_err() {
                return Err(KnapsackError::ColumnTooLarge {
                    index,
                    len: column.len(),
                });
            }
        }

        self.check_ceiling(columns.len(), ceiling)?;

        let width = usize::try_from(ceiling)
            .ok()
            .and_then(|c| c.checked_add(1))
            .ok_or(KnapsackError::CeilingOverflow {
                ceiling,
                cells: u64::MAX,
                max_ceiling: self.limits.max_ceiling,
                max_cells: self.limits.max_cells,
            })?;

        tracing::debug!(
            columns = columns.len(),
            ceiling,
            cells = (columns.len() + 1) * width,
            skip = ?skip,
            "Solving outfit knapsack"
        );

        // table[c]: best similarity reaching exactly cost c, None when unreachable
        let mut table: Vec<Option<f64>> = vec![None; width];
        table[0] = Some(0.0);

        // Row 0 stays empty; row i + 1 records choices made for column i
        let mut path: Vec<Option<Pick>> = vec![None; (columns.len() + 1) * width];

        for (column_idx, column) in columns.iter().enumerate() {
            let mut next: Vec<Option<f64>> = vec![None; width];
            let row_start = (column_idx + 1) * width;
            let row = &mut path[row_start..row_start + width];

            for (cost, previous) in table.iter().enumerate() {
                let Some(previous) = *previous else {
                    continue;
                };

                let skip_option = match skip {
                    SkipPolicy::Allow => Some((Pick::Skip, Item::new(0, 0.0))),
                    SkipPolicy::Forbid => None,
                };
                let options = skip_option.into_iter().chain(
                    column
                        .iter()
                        .enumerate()
                        .map(|(idx, item)| (Pick::Candidate(idx as u32), *item)),
                );

                for (pick, item) in options {
                    let Some(new_cost) = (cost as u64)
                        .checked_add(item.cost)
                        .filter(|new_cost| *new_cost <= ceiling)
                    else {
                        continue;
                    };
                    let new_cost = new_cost as usize;

                    let total = previous + item.similarity;
                    if next[new_cost].map_or(true, |best| total > best) {
                        next[new_cost] = Some(total);
                        row[new_cost] = Some(pick);
                    }
                }
            }

            table = next;
        }

        // Scan downwards with a strict comparison: equal similarity keeps the higher cost
        let mut best: Option<(usize, f64)> = None;
        for cost in (0..width).rev() {
            if let Some(value) = table[cost] {
                if best.map_or(true, |(_, best_value)| value > best_value) {
                    best = Some((cost, value));
                }
            }
        }

        let Some((best_cost, best_similarity)) = best else {
            return Err(KnapsackError::Infeasible { ceiling });
        };

        let mut picks = vec![None; columns.len()];
        let mut remaining = best_cost as u64;

        for column_idx in (0..columns.len()).rev() {
            let broken = KnapsackError::BrokenPath {
                column: column_idx,
                cost: remaining,
            };
            let pick = path[(column_idx + 1) * width + remaining as usize].ok_or(broken.clone())?;

            if let Pick::Candidate(index) = pick {
                let index = index as usize;
                let item = columns[column_idx][index];
                remaining = remaining.checked_sub(item.cost).ok_or(broken)?;
                picks[column_idx] = Some(index);
            }
        }

        if remaining != 0 {
            return Err(KnapsackError::BrokenPath {
                column: 0,
                cost: remaining,
            });
        }

        Ok(Selection {
            picks,
            total_cost: best_cost as u64,
            total_similarity: best_similarity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn column(items: &[(u64, f64)]) -> Vec<Item> {
        items.iter().map(|&(cost, sim)| Item::new(cost, sim)).collect()
    }

    fn engine() -> KnapsackEngine {
        KnapsackEngine::default()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_two_categories_within_budget() {
        let columns = vec![
            column(&[(2000, 0.9), (500, 0.5)]),
            column(&[(3000, 0.8), (1000, 0.6)]),
        ];

        let selection = engine().solve(&columns, 4500, SkipPolicy::Allow).unwrap();

        assert_eq!(selection.picks, vec![Some(0), Some(1)]);
        assert_eq!(selection.total_cost, 3000);
        assert_close(selection.total_similarity, 1.5);
    }

    #[test]
    fn test_zero_ceiling_skips_everything() {
        let columns = vec![column(&[(2000, 0.9)]), column(&[(1000, 0.6)])];

        let selection = engine().solve(&columns, 0, SkipPolicy::Allow).unwrap();

        assert_eq!(selection.picks, vec![None, None]);
        assert!(selection.is_empty());
        assert_eq!(selection.total_cost, 0);
        assert_eq!(selection.total_similarity, 0.0);
    }

    #[test]
    fn test_forbidden_skip_without_room_is_infeasible() {
        let columns = vec![column(&[(2000, 0.9)]), column(&[(1000, 0.6)])];

        let result = engine().solve(&columns, 2500, SkipPolicy::Forbid);

        assert_eq!(result, Err(KnapsackError::Infeasible { ceiling: 2500 }));
    }

    #[test]
    fn test_skip_allows_partial_outfit() {
        let columns = vec![column(&[(2000, 0.9)]), column(&[(3000, 0.8)])];

        let selection = engine().solve(&columns, 3500, SkipPolicy::Allow).unwrap();

        assert_eq!(selection.picks, vec![Some(0), None]);
        assert_eq!(selection.chosen_count(), 1);
        assert_eq!(selection.total_cost, 2000);
    }

    #[test]
    fn test_equal_similarity_same_cost_keeps_first_candidate() {
        let columns = vec![column(&[(100, 0.5), (100, 0.5)])];

        let selection = engine().solve(&columns, 500, SkipPolicy::Forbid).unwrap();

        assert_eq!(selection.picks, vec![Some(0)]);
    }

    #[test]
    fn test_equal_similarity_prefers_higher_cost() {
        let columns = vec![column(&[(100, 0.5), (300, 0.5)])];

        let selection = engine().solve(&columns, 500, SkipPolicy::Forbid).unwrap();

        assert_eq!(selection.picks, vec![Some(1)]);
        assert_eq!(selection.total_cost, 300);
    }

    #[test]
    fn test_skip_wins_over_free_worthless_candidate() {
        let columns = vec![column(&[(0, 0.0)])];

        let skipped = engine().solve(&columns, 0, SkipPolicy::Allow).unwrap();
        assert_eq!(skipped.picks, vec![None]);

        let forced = engine().solve(&columns, 0, SkipPolicy::Forbid).unwrap();
        assert_eq!(forced.picks, vec![Some(0)]);
    }

    #[test]
    fn test_one_item_per_column() {
        // Both items fit the ceiling together, but only one may be taken
        let columns = vec![column(&[(100, 0.6), (200, 0.7)])];

        let selection = engine().solve(&columns, 300, SkipPolicy::Allow).unwrap();

        assert_eq!(selection.picks, vec![Some(1)]);
        assert_close(selection.total_similarity, 0.7);
    }

    #[test]
    fn test_ceiling_above_limit_is_rejected() {
        let engine = KnapsackEngine::new(TableLimits {
            max_ceiling: 1000,
            max_cells: 1_000_000,
        });
        let columns = vec![column(&[(100, 0.6)])];

        let result = engine.solve(&columns, 1001, SkipPolicy::Allow);

        assert!(matches!(
            result,
            Err(KnapsackError::CeilingOverflow { ceiling: 1001, .. })
        ));
    }

    #[test]
    fn test_table_cells_above_limit_is_rejected() {
        let engine = KnapsackEngine::new(TableLimits {
            max_ceiling: 10_000,
            max_cells: 20_000,
        });
        let columns = vec![column(&[(100, 0.6)]), column(&[(100, 0.6)])];

        // 3 rows * 10_001 cells
        let result = engine.check_ceiling(columns.len(), 10_000);

        assert_eq!(
            result,
            Err(KnapsackError::CeilingOverflow {
                ceiling: 10_000,
                cells: 30_003,
                max_ceiling: 10_000,
                max_cells: 20_000,
            })
        );
    }

    #[test]
    fn test_empty_column_is_rejected() {
        let columns = vec![column(&[(100, 0.6)]), vec![]];

        let result = engine().solve(&columns, 1000, SkipPolicy::Allow);

        assert_eq!(result, Err(KnapsackError::EmptyColumn { index: 1 }));
    }

    #[test]
    fn test_no_columns_is_rejected() {
        let result = engine().solve(&[], 1000, SkipPolicy::Allow);
        assert_eq!(result, Err(KnapsackError::NoColumns));
    }

    #[test]
    fn test_candidates_costlier_than_ceiling_are_ignored() {
        let columns = vec![column(&[(5000, 0.99), (400, 0.2)])];

        let selection = engine().solve(&columns, 1000, SkipPolicy::Forbid).unwrap();

        assert_eq!(selection.picks, vec![Some(1)]);
        assert_eq!(selection.total_cost, 400);
    }

    /// Exhaustive search over every combination, mirroring the iteration order of the engine
    fn brute_force(columns: &[Vec<Item>], ceiling: u64, skip: SkipPolicy) -> Option<f64> {
        fn walk(
            columns: &[Vec<Item>],
            ceiling: u64,
            skip: SkipPolicy,
            cost: u64,
            similarity: f64,
            best: &mut Option<f64>,
        ) {
            let Some((first, rest)) = columns.split_first() else {
                if best.map_or(true, |b| similarity > b) {
                    *best = Some(similarity);
                }
                return;
            };

            if skip == SkipPolicy::Allow {
                walk(rest, ceiling, skip, cost, similarity + 0.0, best);
            }
            for item in first {
                if cost + item.cost <= ceiling {
                    walk(
                        rest,
                        ceiling,
                        skip,
                        cost + item.cost,
                        similarity + item.similarity,
                        best,
                    );
                }
            }
        }

        let mut best = None;
        walk(columns, ceiling, skip, 0, 0.0, &mut best);
        best
    }

    fn columns_strategy() -> impl Strategy<Value = Vec<Vec<Item>>> {
        prop::collection::vec(
            prop::collection::vec((0u64..60, 0.0f64..1.0), 1..4)
                .prop_map(|items| column(&items)),
            1..4,
        )
    }

    proptest! {
        #[test]
        fn prop_matches_exhaustive_search(
            columns in columns_strategy(),
            ceiling in 0u64..150,
            allow_skip in any::<bool>(),
        ) {
            let skip = if allow_skip { SkipPolicy::Allow } else { SkipPolicy::Forbid };
            let expected = brute_force(&columns, ceiling, skip);

            match engine().solve(&columns, ceiling, skip) {
                Ok(selection) => {
                    let expected = expected.expect("engine found a selection the search did not");
                    prop_assert!((selection.total_similarity - expected).abs() < 1e-9);
                }
                Err(KnapsackError::Infeasible { .. }) => prop_assert!(expected.is_none()),
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        #[test]
        fn prop_selection_is_consistent(
            columns in columns_strategy(),
            ceiling in 0u64..150,
        ) {
            let selection = engine().solve(&columns, ceiling, SkipPolicy::Allow).unwrap();

            prop_assert!(selection.total_cost <= ceiling);
            prop_assert_eq!(selection.picks.len(), columns.len());

            let mut cost = 0;
            let mut similarity = 0.0;
            for (column, pick) in columns.iter().zip(&selection.picks) {
                if let Some(index) = pick {
                    cost += column[*index].cost;
                    similarity += column[*index].similarity;
                } else {
                    similarity += 0.0;
                }
            }
            prop_assert_eq!(cost, selection.total_cost);
            prop_assert_eq!(similarity, selection.total_similarity);
        }

        #[test]
        fn prop_larger_ceiling_never_lowers_similarity(
            columns in columns_strategy(),
            ceiling in 0u64..150,
            extra in 0u64..100,
        ) {
            let low = engine().solve(&columns, ceiling, SkipPolicy::Allow).unwrap();
            let high = engine().solve(&columns, ceiling + extra, SkipPolicy::Allow).unwrap();

            prop_assert!(high.total_similarity >= low.total_similarity);
        }

        #[test]
        fn prop_solving_twice_is_identical(
            columns in columns_strategy(),
            ceiling in 0u64..150,
        ) {
            let first = engine().solve(&columns, ceiling, SkipPolicy::Allow);
            let second = engine().solve(&columns, ceiling, SkipPolicy::Allow);

            prop_assert_eq!(first, second);
        }
    }
}
