use crate::error::CutError;
use crate::types::{CuttingPattern, DemandSet, OptimizationResult, PlanEntry};

/// Outstanding demand for one piece length while the greedy loop runs.
#[derive(Debug, Clone, Copy)]
struct WorkItem {
    length: u32,
    remaining: u32,
}

pub struct Solver<'a> {
    stock_length: u32,
    demands: &'a DemandSet,
}

impl<'a> Solver<'a> {
    pub fn new(stock_length: u32, demands: &'a DemandSet) -> Self {
        Self {
            stock_length,
            demands,
        }
    }

    pub fn solve(&self) -> Result<OptimizationResult, CutError> {
        if self.demands.is_empty() {
            return Err(CutError::EmptyDemandSet);
        }

        let mut work = self.working_copy();
        if let Some(item) = work.iter().find(|w| w.length > self.stock_length) {
            return Err(CutError::OversizedDemand {
                length: item.length,
                stock_length: self.stock_length,
            });
        }

        let mut plan: Vec<PlanEntry> = Vec::new();
        let mut total_stock_used: u64 = 0;
        let mut total_used_length: u64 = 0;

        while work.iter().any(|w| w.remaining > 0) {
            let (pattern, waste) = self.cut_one_unit(&mut work);
            if pattern.is_empty() {
                return Err(CutError::InfeasibleDemand {
                    stock_length: self.stock_length,
                });
            }

            let used = pattern.used_length();
            total_stock_used += 1;
            total_used_length += used;

            match plan.iter_mut().find(|e| e.pattern == pattern) {
                Some(entry) => entry.repeat_count += 1,
                None => {
                    tracing::debug!(
                        stock_length = self.stock_length,
                        pattern = %pattern,
                        waste,
                        "new cutting pattern"
                    );
                    plan.push(PlanEntry {
                        pattern,
                        repeat_count: 1,
                        utilization: percent(used, self.stock_length as u64),
                        waste,
                    });
                }
            }
        }

        let total_stock_length = total_stock_used * self.stock_length as u64;
        let result = OptimizationResult {
            stock_length: self.stock_length,
            cutting_plan: plan,
            total_stock_used,
            total_utilization: percent(total_used_length, total_stock_length),
            total_waste: total_stock_length - total_used_length,
        };
        tracing::debug!(
            stock_length = self.stock_length,
            patterns = result.pattern_count(),
            stock_used = result.total_stock_used,
            utilization = result.total_utilization,
            "optimization finished"
        );
        Ok(result)
    }

    /// Private copy of the demand, longest piece first.
    fn working_copy(&self) -> Vec<WorkItem> {
        self.demands
            .iter()
            .rev()
            .map(|d| WorkItem {
                length: d.length,
                remaining: d.qty,
            })
            .collect()
    }

    /// Fills one stock unit first-fit over `work` and returns its pattern
    /// along with the leftover length.
    fn cut_one_unit(&self, work: &mut [WorkItem]) -> (CuttingPattern, u32) {
        let mut remaining_length = self.stock_length;
        let mut pattern = CuttingPattern::new();

        for item in work.iter_mut() {
            if item.remaining == 0 || item.length > remaining_length {
                continue;
            }
            let count = (remaining_length / item.length).min(item.remaining);
            if count > 0 {
                pattern.add(item.length, count);
                remaining_length -= count * item.length;
                item.remaining -= count;
            }
        }

        (pattern, remaining_length)
    }
}

/// Plans `demands` against a single stock length.
pub fn optimize(stock_length: u32, demands: &DemandSet) -> Result<OptimizationResult, CutError> {
    Solver::new(stock_length, demands).solve()
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
