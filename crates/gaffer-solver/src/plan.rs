// Result artifacts produced by the selectors and the transfer planner.
//
// Built once per solve from the solver's variable values and never updated
// afterwards.

use serde::Serialize;

use gaffer_core::{Asset, AssetId, PeriodId, Price};

use crate::model::SolveStatus;

/// Output of the single-period squad selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadSelection {
    pub status: SolveStatus,
    pub period: PeriodId,
    /// Selected assets ordered by position, then id.
    pub squad: Vec<Asset>,
    pub total_price: Price,
    /// Sum of the selected assets' forecast scores.
    pub total_score: f64,
}

impl SquadSelection {
    pub fn ids(&self) -> Vec<AssetId> {
        self.squad.iter().map(|a| a.id).collect()
    }
}

/// Output of the starting-lineup selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupSelection {
    pub status: SolveStatus,
    pub period: PeriodId,
    /// Starters ordered by position, then id.
    pub starters: Vec<AssetId>,
    /// Non-starters, highest forecast first.
    pub bench: Vec<AssetId>,
    pub captain: AssetId,
    pub vice_captain: AssetId,
    /// Starters' scores plus the captain's score once more.
    pub objective: f64,
}

/// One period of a multi-period plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodPlan {
    pub period: PeriodId,
    /// Owned assets ordered by position, then id.
    pub squad: Vec<AssetId>,
    pub starters: Vec<AssetId>,
    pub bench: Vec<AssetId>,
    pub captain: AssetId,
    pub vice_captain: AssetId,
    /// False for an as-is first period, which carries no transfer decision.
    pub transfer_period: bool,
    pub transfers_in: Vec<AssetId>,
    pub transfers_out: Vec<AssetId>,
    /// Free transfers consumed this period.
    pub free_used: u32,
    pub hits: u32,
    /// Ledger value entering the next period.
    pub free_transfers_next: u32,
    /// Bank after this period's transfers, for the carried-bank policy.
    pub bank: Option<Price>,
    pub bench_boost: bool,
    /// Lineup score including captaincy and any bench boost, before hits.
    pub score: f64,
}

impl PeriodPlan {
    pub fn is_hold(&self) -> bool {
        self.transfers_in.is_empty()
    }
}

/// Output of the multi-period transfer planner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferPlan {
    pub status: SolveStatus,
    /// Periods in increasing order.
    pub periods: Vec<PeriodPlan>,
    pub total_hits: u32,
    pub hit_cost: f64,
    /// Sum of period scores minus hit penalties.
    pub objective: f64,
    pub bench_boost_period: Option<PeriodId>,
}

impl TransferPlan {
    pub fn period(&self, id: PeriodId) -> Option<&PeriodPlan> {
        self.periods.iter().find(|p| p.period == id)
    }

    pub fn total_transfers(&self) -> usize {
        self.periods.iter().map(|p| p.transfers_in.len()).sum()
    }
}

/// One greedy replacement proposal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub out: AssetId,
    pub incoming: AssetId,
    /// Forecast gain over the scoring window.
    pub gain: f64,
}
