// Periods (gameweeks) and optimization horizons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete period, e.g. a gameweek number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(pub u32);

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HorizonError {
    #[error("horizon must contain at least one period")]
    Empty,

    #[error("horizon periods must be strictly increasing ({prev} then {next})")]
    NotIncreasing { prev: PeriodId, next: PeriodId },
}

/// Ordered, strictly increasing sequence of periods solved jointly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Horizon {
    periods: Vec<PeriodId>,
}

impl Horizon {
    pub fn new(periods: Vec<PeriodId>) -> Result<Self, HorizonError> {
        if periods.is_empty() {
            return Err(HorizonError::Empty);
        }
        for pair in periods.windows(2) {
            if pair[1] <= pair[0] {
                return Err(HorizonError::NotIncreasing {
                    prev: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Horizon { periods })
    }

    /// Single-period horizon.
    pub fn single(period: PeriodId) -> Self {
        Horizon {
            periods: vec![period],
        }
    }

    /// `len` consecutive periods starting at `start`, clipped at `last`
    /// (the season's final period).
    pub fn lookahead(start: PeriodId, len: u32, last: PeriodId) -> Result<Self, HorizonError> {
        let end = start.0.saturating_add(len).min(last.0.saturating_add(1));
        Horizon::new((start.0..end).map(PeriodId).collect())
    }

    pub fn periods(&self) -> &[PeriodId] {
        &self.periods
    }

    pub fn first(&self) -> PeriodId {
        self.periods[0]
    }

    pub fn last(&self) -> PeriodId {
        self.periods[self.periods.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PeriodId> + '_ {
        self.periods.iter().copied()
    }
}
