// Subcommand workflows: wire configuration and catalogue data into the
// solver entry points.

use std::collections::HashMap;
use tracing::{info, warn};

use gaffer_core::{Asset, AssetId, Catalogue, Horizon, PeriodId, Price};
use gaffer_solver::{
    candidate_universe, plan_transfers, select_lineup, select_squad, suggest_transfers,
    BudgetPolicy, InputError, LineupSelection, PlanInput, SolveError, SquadSelection, Suggestion,
    TransferPlan,
};

use crate::config::Config;

/// Loaded configuration and catalogue shared by every subcommand.
pub struct Session<'a> {
    pub config: &'a Config,
    pub catalogue: &'a Catalogue,
}

/// Command-line overrides for a planning run.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub period: Option<PeriodId>,
    /// Current squad; a fresh squad is selected when absent.
    pub squad: Option<Vec<AssetId>>,
    pub bank: Option<Price>,
    pub free_transfers: Option<u32>,
    pub lookahead: Option<u32>,
}

impl<'a> Session<'a> {
    pub fn new(config: &'a Config, catalogue: &'a Catalogue) -> Self {
        Session { config, catalogue }
    }

    fn start(&self, period: Option<PeriodId>) -> PeriodId {
        period.unwrap_or(self.config.strategy.horizon.start)
    }

    /// Look-ahead horizon from `start`, clipped at the season's last period.
    pub fn horizon(&self, start: PeriodId, lookahead: Option<u32>) -> Result<Horizon, SolveError> {
        let horizon = &self.config.strategy.horizon;
        let len = lookahead.unwrap_or(horizon.lookahead);
        Ok(Horizon::lookahead(start, len, horizon.last_period).map_err(InputError::from)?)
    }

    /// Map squad ids to catalogue assets.
    fn resolve(&self, squad: &[AssetId]) -> Result<Vec<Asset>, SolveError> {
        let by_id: HashMap<AssetId, &Asset> = self.catalogue.by_id();
        squad
            .iter()
            .map(|id| {
                by_id
                    .get(id)
                    .map(|&a| a.clone())
                    .ok_or_else(|| SolveError::InvalidInput(InputError::UnknownAsset(*id)))
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Subcommands
    // -----------------------------------------------------------------------

    /// Best squad for one period, then its best lineup.
    pub fn select(
        &self,
        period: Option<PeriodId>,
    ) -> Result<(SquadSelection, LineupSelection), SolveError> {
        let period = self.start(period);
        let strategy = &self.config.strategy;
        let options = strategy.solve_options();
        let squad = select_squad(
            &self.catalogue.assets,
            &self.catalogue.scores,
            period,
            &self.config.rules,
            strategy.selector,
            &options,
        )?;
        let lineup = select_lineup(
            &squad.squad,
            &self.catalogue.scores,
            period,
            &self.config.rules,
            &options,
        )?;
        Ok((squad, lineup))
    }

    /// Best lineup for a given squad.
    pub fn lineup(
        &self,
        period: Option<PeriodId>,
        squad: &[AssetId],
    ) -> Result<LineupSelection, SolveError> {
        let members = self.resolve(squad)?;
        select_lineup(
            &members,
            &self.catalogue.scores,
            self.start(period),
            &self.config.rules,
            &self.config.strategy.solve_options(),
        )
    }

    /// Multi-period transfer plan from the given (or a freshly selected) squad.
    pub fn plan(&self, request: &PlanRequest) -> Result<TransferPlan, SolveError> {
        let start = self.start(request.period);
        let horizon = self.horizon(start, request.lookahead)?;
        let strategy = &self.config.strategy;

        let squad = match &request.squad {
            Some(ids) => ids.clone(),
            None => {
                info!("no squad given, selecting one for GW {}", horizon.first());
                self.select(Some(horizon.first()))?.0.ids()
            }
        };

        let mut settings = strategy.planner.clone();
        if let Some(bank) = request.bank {
            settings.budget = with_bank(settings.budget, bank);
        }
        if let Some(n) = request.free_transfers {
            settings.initial_free_transfers = n;
        }

        let universe = candidate_universe(
            &self.catalogue.assets,
            &self.catalogue.scores,
            &horizon,
            &squad,
            strategy.candidates_per_position,
        )?;
        let input = PlanInput {
            universe: &universe,
            scores: &self.catalogue.scores,
            horizon: &horizon,
            initial_squad: &squad,
        };
        plan_transfers(&input, &self.config.rules, &settings, &strategy.solve_options())
    }

    /// Greedy like-for-like swaps over the look-ahead window.
    pub fn suggest(
        &self,
        period: Option<PeriodId>,
        squad: &[AssetId],
        count: usize,
        lookahead: Option<u32>,
    ) -> Result<Vec<Suggestion>, SolveError> {
        let horizon = self.horizon(self.start(period), lookahead)?;
        Ok(suggest_transfers(
            squad,
            &self.catalogue.assets,
            &self.catalogue.scores,
            horizon.periods(),
            count,
            &self.config.rules,
        )?)
    }
}

/// Replace the starting bank of a bank-based policy. A flat cap has no bank.
fn with_bank(policy: BudgetPolicy, bank: Price) -> BudgetPolicy {
    match policy {
        BudgetPolicy::RollingBank { .. } => BudgetPolicy::RollingBank { bank },
        BudgetPolicy::CarriedBank { .. } => BudgetPolicy::CarriedBank { bank },
        BudgetPolicy::FlatCap { .. } => {
            warn!("--bank {} ignored under a flat budget cap", bank);
            policy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_override_keeps_policy_kind() {
        assert_eq!(
            with_bank(BudgetPolicy::RollingBank { bank: Price(0) }, Price(15)),
            BudgetPolicy::RollingBank { bank: Price(15) }
        );
        assert_eq!(
            with_bank(BudgetPolicy::CarriedBank { bank: Price(3) }, Price(15)),
            BudgetPolicy::CarriedBank { bank: Price(15) }
        );
        assert_eq!(
            with_bank(BudgetPolicy::FlatCap { cap: Price(1000) }, Price(15)),
            BudgetPolicy::FlatCap { cap: Price(1000) }
        );
    }
}
