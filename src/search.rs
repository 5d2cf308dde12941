use rayon::prelude::*;

use crate::error::CutError;
use crate::solver::Solver;
use crate::types::{DemandSet, SearchRange, SearchResult};

/// Number of candidates callers show by default.
pub const DEFAULT_TOP: usize = 5;

/// Upper bound on stock lengths evaluated by one search.
pub const MAX_CANDIDATES: u64 = 10_000;

/// Runs the optimizer for every stock length in `range` and ranks the
/// feasible ones: highest total utilization first, fewer stock units
/// breaking ties. Candidates are evaluated in parallel.
///
/// Ranges that are empty, use a zero step or hold more than
/// [`MAX_CANDIDATES`] lengths are rejected before any work.
pub fn search(demands: &DemandSet, range: SearchRange) -> Result<Vec<SearchResult>, CutError> {
    if demands.is_empty() {
        return Err(CutError::EmptyDemandSet);
    }
    let candidates = range.candidate_count();
    if candidates == 0 || candidates > MAX_CANDIDATES {
        return Err(CutError::InvalidRange {
            min_length: range.min_length,
            max_length: range.max_length,
            step: range.step,
        });
    }

    let mut results: Vec<SearchResult> = (0..candidates as u32)
        .into_par_iter()
        .filter_map(|i| {
            let stock_length = range.length_at(i);
            match Solver::new(stock_length, demands).solve() {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::debug!(stock_length, error = %e, "candidate discarded");
                    None
                }
            }
        })
        .collect();

    if results.is_empty() {
        return Err(CutError::NoFeasibleLength {
            min_length: range.min_length,
            max_length: range.max_length,
        });
    }

    results.sort_by(|a, b| {
        b.total_utilization
            .total_cmp(&a.total_utilization)
            .then(a.total_stock_used.cmp(&b.total_stock_used))
    });

    tracing::info!(
        candidates,
        feasible = results.len(),
        best_length = results[0].stock_length,
        best_utilization = results[0].total_utilization,
        "stock length search finished"
    );
    Ok(results)
}
