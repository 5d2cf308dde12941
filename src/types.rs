use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CutError;

/// A required piece length together with how many pieces are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub qty: u32,
}

impl Demand {
    pub fn new(length: u32, qty: u32) -> Self {
        Self { length, qty }
    }
}

/// Normalized demand: length -> quantity, lengths unique.
///
/// Callers are expected to only insert positive lengths and quantities;
/// the optimizer does not re-check them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DemandSet(BTreeMap<u32, u32>);

impl DemandSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw demands, summing duplicate lengths.
    pub fn from_demands<I>(demands: I) -> Result<Self, CutError>
    where
        I: IntoIterator<Item = Demand>,
    {
        let mut set = DemandSet::new();
        for d in demands {
            set.add(d.length, d.qty)?;
        }
        Ok(set)
    }

    /// Adds `qty` pieces of `length`, summing with any existing entry.
    pub fn add(&mut self, length: u32, qty: u32) -> Result<(), CutError> {
        let entry = self.0.entry(length).or_insert(0);
        *entry = entry
            .checked_add(qty)
            .ok_or(CutError::QuantityOverflow { length })?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn quantity(&self, length: u32) -> u32 {
        self.0.get(&length).copied().unwrap_or(0)
    }

    pub fn total_pieces(&self) -> u64 {
        self.0.values().map(|&q| q as u64).sum()
    }

    /// Entries in ascending length order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Demand> + '_ {
        self.0.iter().map(|(&length, &qty)| Demand { length, qty })
    }
}

/// Pieces sawn from a single stock unit: length -> count.
///
/// Backed by a sorted map so two patterns compare equal whatever order
/// their pieces were added in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CuttingPattern(BTreeMap<u32, u32>);

impl CuttingPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, length: u32, count: u32) {
        *self.0.entry(length).or_insert(0) += count;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count(&self, length: u32) -> u32 {
        self.0.get(&length).copied().unwrap_or(0)
    }

    pub fn used_length(&self) -> u64 {
        self.0
            .iter()
            .map(|(&length, &count)| length as u64 * count as u64)
            .sum()
    }

    /// `(length, count)` pairs, longest piece first.
    pub fn pieces(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.0.iter().rev().map(|(&length, &count)| (length, count))
    }
}

impl std::fmt::Display for CuttingPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (length, count)) in self.pieces().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}×{}mm", count, length)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub pattern: CuttingPattern,
    pub repeat_count: u32,
    pub utilization: f64,
    pub waste: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub stock_length: u32,
    pub cutting_plan: Vec<PlanEntry>,
    pub total_stock_used: u64,
    pub total_utilization: f64,
    pub total_waste: u64,
}

impl OptimizationResult {
    pub fn pattern_count(&self) -> usize {
        self.cutting_plan.len()
    }

    /// Total pieces of `length` produced across every stock unit.
    pub fn produced(&self, length: u32) -> u64 {
        self.cutting_plan
            .iter()
            .map(|e| e.repeat_count as u64 * e.pattern.count(length) as u64)
            .sum()
    }
}

/// One ranked candidate of a stock-length search. The result already
/// carries the stock length it was planned against.
pub type SearchResult = OptimizationResult;

/// Inclusive arithmetic range of candidate stock lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    pub min_length: u32,
    pub max_length: u32,
    pub step: u32,
}

impl SearchRange {
    pub fn new(min_length: u32, max_length: u32, step: u32) -> Self {
        Self {
            min_length,
            max_length,
            step,
        }
    }

    /// Number of lengths in the range; zero when the range is malformed.
    pub fn candidate_count(&self) -> u64 {
        if self.step == 0 || self.min_length > self.max_length {
            return 0;
        }
        (self.max_length - self.min_length) as u64 / self.step as u64 + 1
    }

    /// The `index`-th candidate length. `index` must be below `candidate_count()`.
    pub fn length_at(&self, index: u32) -> u32 {
        self.min_length + index * self.step
    }
}

/// Accepts integral JSON numbers in either integer or float form (`355`, `355.0`).
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {}",
            value
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_set_sums_duplicates() {
        let set = DemandSet::from_demands([
            Demand::new(355, 4),
            Demand::new(200, 1),
            Demand::new(355, 6),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.quantity(355), 10);
        assert_eq!(set.quantity(200), 1);
        assert_eq!(set.total_pieces(), 11);
    }

    #[test]
    fn test_demand_set_quantity_overflow() {
        let err = DemandSet::from_demands([Demand::new(10, u32::MAX), Demand::new(10, 5)]);
        assert_eq!(err, Err(CutError::QuantityOverflow { length: 10 }));

        let mut set = DemandSet::new();
        set.add(10, u32::MAX).unwrap();
        assert!(set.add(10, 1).is_err());
        assert_eq!(set.quantity(10), u32::MAX);
    }

    #[test]
    fn test_pattern_equality_ignores_insertion_order() {
        let mut a = CuttingPattern::new();
        a.add(600, 1);
        a.add(400, 1);
        let mut b = CuttingPattern::new();
        b.add(400, 1);
        b.add(600, 1);
        assert_eq!(a, b);
        assert_eq!(a.used_length(), 1000);
    }

    #[test]
    fn test_pattern_display_longest_first() {
        let mut p = CuttingPattern::new();
        p.add(200, 2);
        p.add(355, 3);
        assert_eq!(p.to_string(), "3×355mm + 2×200mm");
    }

    #[test]
    fn test_search_range_candidates() {
        let range = SearchRange::new(1000, 1250, 100);
        assert_eq!(range.candidate_count(), 3);
        assert_eq!(range.length_at(0), 1000);
        assert_eq!(range.length_at(2), 1200);

        assert_eq!(SearchRange::new(1000, 1200, 100).candidate_count(), 3);
        assert_eq!(SearchRange::new(1000, 1000, 50).candidate_count(), 1);
        assert_eq!(SearchRange::new(1000, 1200, 0).candidate_count(), 0);
        assert_eq!(SearchRange::new(1200, 1000, 100).candidate_count(), 0);
        assert_eq!(SearchRange::new(1, u32::MAX, 1).candidate_count(), u32::MAX as u64);
        assert_eq!(SearchRange::new(0, u32::MAX, 1).candidate_count(), u32::MAX as u64 + 1);
    }

    #[test]
    fn test_deserialize_number_forms() {
        let d: Demand = serde_json::from_str(r#"{"length": 355.0, "qty": 10}"#).unwrap();
        assert_eq!(d, Demand::new(355, 10));
        assert!(serde_json::from_str::<Demand>(r#"{"length": 355.5, "qty": 1}"#).is_err());
        assert!(serde_json::from_str::<Demand>(r#"{"length": -1, "qty": 1}"#).is_err());
    }
}
