// Game rules: squad composition, formation, team cap, budget and transfer costs.
//
// Passed explicitly into every solve so different rule variants can run side
// by side.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::Price;
use crate::position::{Position, PositionMap};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid rule `{field}`: {message}")]
pub struct RulesError {
    pub field: String,
    pub message: String,
}

impl RulesError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        RulesError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Inclusive `[min, max]` bounds on a starting-lineup position count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: usize,
    pub max: usize,
}

impl Bounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub squad_size: usize,
    pub lineup_size: usize,
    /// Exact number of squad members per position.
    pub squad_quota: PositionMap<usize>,
    /// Starting-lineup bounds per position.
    pub formation: PositionMap<Bounds>,
    /// Maximum squad members from any one team.
    pub team_cap: usize,
    /// Flat budget cap (selector and the flat-cap budget policy).
    pub budget: Price,
    /// Points deducted per paid transfer.
    pub hit_cost: f64,
    /// Upper bound of the free-transfer ledger.
    pub max_free_transfers: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        GameRules {
            squad_size: 15,
            lineup_size: 11,
            squad_quota: PositionMap::new(2, 5, 5, 3),
            formation: PositionMap::new(
                Bounds::new(1, 1),
                Bounds::new(3, 5),
                Bounds::new(2, 5),
                Bounds::new(1, 3),
            ),
            team_cap: 3,
            budget: Price(1000),
            hit_cost: 4.0,
            max_free_transfers: 5,
        }
    }
}

impl GameRules {
    pub fn quota(&self, pos: Position) -> usize {
        *self.squad_quota.get(pos)
    }

    pub fn formation_bounds(&self, pos: Position) -> Bounds {
        *self.formation.get(pos)
    }

    /// Check that the rules admit at least one squad and lineup shape.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.squad_size == 0 {
            return Err(RulesError::new("squad_size", "must be greater than 0"));
        }
        if self.squad_quota.total() != self.squad_size {
            return Err(RulesError::new(
                "squad_quota",
                format!(
                    "quotas sum to {}, expected squad_size {}",
                    self.squad_quota.total(),
                    self.squad_size
                ),
            ));
        }
        if self.lineup_size == 0 || self.lineup_size > self.squad_size {
            return Err(RulesError::new(
                "lineup_size",
                format!("must be between 1 and squad_size {}", self.squad_size),
            ));
        }

        let mut min_total = 0;
        let mut max_total = 0;
        for (pos, bounds) in self.formation.iter() {
            if bounds.min > bounds.max {
                return Err(RulesError::new(
                    format!("formation.{}", pos.display_str().to_lowercase()),
                    format!("min {} exceeds max {}", bounds.min, bounds.max),
                ));
            }
            if bounds.max > self.quota(pos) {
                return Err(RulesError::new(
                    format!("formation.{}", pos.display_str().to_lowercase()),
                    format!("max {} exceeds squad quota {}", bounds.max, self.quota(pos)),
                ));
            }
            min_total += bounds.min;
            max_total += bounds.max;
        }
        if !(min_total..=max_total).contains(&self.lineup_size) {
            return Err(RulesError::new(
                "lineup_size",
                format!(
                    "{} is not reachable within formation bounds ({min_total}..={max_total})",
                    self.lineup_size
                ),
            ));
        }
        if self.lineup_size < 2 {
            return Err(RulesError::new(
                "lineup_size",
                "must be at least 2 to name a captain and a vice-captain",
            ));
        }

        if self.team_cap == 0 {
            return Err(RulesError::new("team_cap", "must be greater than 0"));
        }
        if !self.hit_cost.is_finite() || self.hit_cost < 0.0 {
            return Err(RulesError::new(
                "hit_cost",
                format!("must be finite and >= 0, got {}", self.hit_cost),
            ));
        }
        if self.max_free_transfers == 0 {
            return Err(RulesError::new("max_free_transfers", "must be at least 1"));
        }
        Ok(())
    }
}
