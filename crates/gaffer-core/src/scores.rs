// Forecast score table: (asset, period) -> scalar score.

use std::collections::{BTreeSet, HashMap};

use crate::asset::AssetId;
use crate::horizon::PeriodId;

/// Per-(asset, period) forecast scores, as supplied by the scoring provider.
///
/// Treated as authoritative for the duration of a solve; never mutated by the
/// optimizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    scores: HashMap<(AssetId, PeriodId), f64>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a score. Returns the previous value, if any.
    pub fn insert(&mut self, asset: AssetId, period: PeriodId, score: f64) -> Option<f64> {
        self.scores.insert((asset, period), score)
    }

    pub fn get(&self, asset: AssetId, period: PeriodId) -> Option<f64> {
        self.scores.get(&(asset, period)).copied()
    }

    /// Sum of an asset's scores over the given periods, treating missing
    /// entries as zero.
    pub fn window_total(&self, asset: AssetId, periods: &[PeriodId]) -> f64 {
        periods
            .iter()
            .filter_map(|&p| self.get(asset, p))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetId, PeriodId, f64)> + '_ {
        self.scores.iter().map(|(&(a, p), &s)| (a, p, s))
    }

    /// Distinct asset ids referenced by any entry.
    pub fn assets(&self) -> BTreeSet<AssetId> {
        self.scores.keys().map(|&(a, _)| a).collect()
    }

    /// Distinct periods referenced by any entry, ascending.
    pub fn periods(&self) -> BTreeSet<PeriodId> {
        self.scores.keys().map(|&(_, p)| p).collect()
    }
}

impl FromIterator<(AssetId, PeriodId, f64)> for ScoreTable {
    fn from_iter<I: IntoIterator<Item = (AssetId, PeriodId, f64)>>(iter: I) -> Self {
        let mut table = ScoreTable::new();
        for (asset, period, score) in iter {
            table.insert(asset, period, score);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_window_total() {
        let table: ScoreTable = [
            (AssetId(1), PeriodId(5), 4.0),
            (AssetId(1), PeriodId(6), 2.5),
            (AssetId(2), PeriodId(5), 1.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.get(AssetId(1), PeriodId(6)), Some(2.5));
        assert_eq!(table.get(AssetId(2), PeriodId(6)), None);
        assert!((table.window_total(AssetId(1), &[PeriodId(5), PeriodId(6)]) - 6.5).abs() < 1e-9);
        assert!((table.window_total(AssetId(2), &[PeriodId(5), PeriodId(6)]) - 1.0).abs() < 1e-9);
        assert_eq!(table.assets().len(), 2);
        assert_eq!(
            table.periods().into_iter().collect::<Vec<_>>(),
            vec![PeriodId(5), PeriodId(6)]
        );
    }

    #[test]
    fn insert_replaces() {
        let mut table = ScoreTable::new();
        assert_eq!(table.insert(AssetId(1), PeriodId(1), 1.0), None);
        assert_eq!(table.insert(AssetId(1), PeriodId(1), 3.0), Some(1.0));
        assert_eq!(table.len(), 1);
    }
}
