// Multi-period transfer planner.
//
// One MIP over the whole horizon decides ownership, starters, armbands and
// transfers for every period, so a hit taken now to set up a better period
// later is weighed against holding. Budget handling and the bench-boost chip
// are strategy parameters of the same model.

use good_lp::constraint::{eq, geq, leq};
use good_lp::{variable, Constraint, Expression, ProblemVariables, Solution, Variable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use gaffer_core::{Asset, AssetId, GameRules, Horizon, PeriodId, Price, ScoreTable, TeamId};

use crate::model::{
    constant, is_set, maximise, tie_break_weights, total, weighted_sum, AssetIndex, SolveError,
    SolveOptions, SolveStatus, TieBreak, VarTable, TIE_BREAK_BUDGET,
};
use crate::plan::{PeriodPlan, TransferPlan};
use crate::validate::{check_scores, check_squad, index_universe, InputError};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// How the first period of the horizon is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstPeriod {
    /// The initial squad plays the first period unchanged; transfers start
    /// in the second period.
    #[default]
    AsIs,
    /// The initial squad is the state before the first period, which may
    /// itself carry transfers.
    TransferEligible,
}

/// Spending rule applied to squads and transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BudgetPolicy {
    /// Total squad price never exceeds `cap` in any period.
    FlatCap { cap: Price },
    /// Buys in the first transfer period may use `bank` on top of that
    /// period's sales; later periods must be covered by their own sales.
    RollingBank { bank: Price },
    /// A non-negative bank balance is carried across periods: it starts at
    /// `bank` and moves by each period's sales minus purchases.
    CarriedBank { bank: Price },
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        BudgetPolicy::CarriedBank { bank: Price::ZERO }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub first_period: FirstPeriod,
    pub budget: BudgetPolicy,
    /// Ledger value at the first transfer period.
    pub initial_free_transfers: u32,
    /// Allow the bench-boost chip once within the horizon.
    pub bench_boost: bool,
    /// Forbid buying assets flagged unavailable.
    pub block_unavailable_buys: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        PlannerSettings {
            first_period: FirstPeriod::AsIs,
            budget: BudgetPolicy::default(),
            initial_free_transfers: 1,
            bench_boost: false,
            block_unavailable_buys: true,
        }
    }
}

/// Immutable inputs to one planning solve.
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    /// Every asset the planner may own; must include the initial squad.
    pub universe: &'a [Asset],
    pub scores: &'a ScoreTable,
    pub horizon: &'a Horizon,
    pub initial_squad: &'a [AssetId],
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Solve the whole horizon jointly and return the per-period plan.
///
/// Malformed input is rejected before a model is built. Any solver outcome
/// other than optimal is returned as `SolveError::NotOptimal`; no plan is
/// produced in that case.
pub fn plan_transfers(
    input: &PlanInput<'_>,
    rules: &GameRules,
    settings: &PlannerSettings,
    options: &SolveOptions,
) -> Result<TransferPlan, SolveError> {
    rules.validate().map_err(InputError::from)?;
    let by_id = index_universe(input.universe)?;
    check_squad(input.initial_squad, &by_id, rules)?;
    check_scores(input.universe, input.scores, input.horizon.periods())?;
    if settings.initial_free_transfers > rules.max_free_transfers {
        return Err(InputError::FreeTransfersAboveCap {
            found: settings.initial_free_transfers,
            cap: rules.max_free_transfers,
        }
        .into());
    }

    let periods = input.horizon.periods().to_vec();
    let points: Vec<Vec<f64>> = input
        .universe
        .iter()
        .map(|a| {
            periods
                .iter()
                .map(|&p| input.scores.get(a.id, p).unwrap_or(0.0))
                .collect()
        })
        .collect();
    let initial: Vec<bool> = input
        .universe
        .iter()
        .map(|a| input.initial_squad.contains(&a.id))
        .collect();

    info!(
        "planning {} periods ({}..={}) over {} assets",
        periods.len(),
        input.horizon.first(),
        input.horizon.last(),
        input.universe.len()
    );

    let model = PlanModel {
        assets: input.universe.to_vec(),
        points,
        initial,
        periods,
        rules: rules.clone(),
        settings: settings.clone(),
        tie_break: options.tie_break,
    };
    model.solve(options.time_limit)
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Owned snapshot of the inputs, aligned by row with the variable tables.
struct PlanModel {
    assets: Vec<Asset>,
    /// `points[row][column]`, columns aligned with `periods`.
    points: Vec<Vec<f64>>,
    initial: Vec<bool>,
    periods: Vec<PeriodId>,
    rules: GameRules,
    settings: PlannerSettings,
    tie_break: TieBreak,
}

/// Decision variables of one planning model. Transfer-side tables have one
/// column per transfer period; column `k` is horizon column `first + k`.
struct PlanVars {
    own: VarTable,
    start: VarTable,
    captain: VarTable,
    vice: VarTable,
    buy: VarTable,
    sell: VarTable,
    free: Vec<Variable>,
    used: Vec<Variable>,
    hits: Vec<Variable>,
    /// Ledger overflow indicator, from the second transfer period on.
    capped: Vec<Variable>,
    bank: Vec<Variable>,
    boost: Vec<Variable>,
    bench: VarTable,
}

impl PlanModel {
    /// Horizon column of the first transfer period.
    fn first_transfer(&self) -> usize {
        match self.settings.first_period {
            FirstPeriod::AsIs => 1,
            FirstPeriod::TransferEligible => 0,
        }
    }

    fn transfer_columns(&self) -> usize {
        self.periods.len().saturating_sub(self.first_transfer())
    }

    fn price(&self, row: usize) -> f64 {
        f64::from(self.assets[row].price.tenths())
    }

    fn solve(self, time_limit: Option<Duration>) -> Result<TransferPlan, SolveError> {
        let index = AssetIndex::new(self.assets.iter().map(|a| a.id).collect());
        let n = index.len();
        let horizon = self.periods.len();
        let transfers = self.transfer_columns();
        let cap = self.rules.max_free_transfers;

        let mut problem = ProblemVariables::new();
        let binary = || variable().binary();
        let vars = PlanVars {
            own: VarTable::new(&mut problem, n, horizon, binary),
            start: VarTable::new(&mut problem, n, horizon, binary),
            captain: VarTable::new(&mut problem, n, horizon, binary),
            vice: VarTable::new(&mut problem, n, horizon, binary),
            buy: VarTable::new(&mut problem, n, transfers, binary),
            sell: VarTable::new(&mut problem, n, transfers, binary),
            free: (0..transfers)
                .map(|_| problem.add(variable().integer().min(0).max(cap)))
                .collect(),
            used: (0..transfers)
                .map(|_| problem.add(variable().integer().min(0).max(cap)))
                .collect(),
            hits: (0..transfers)
                .map(|_| problem.add(variable().integer().min(0).max(self.rules.squad_size as u32)))
                .collect(),
            capped: (1..transfers).map(|_| problem.add(binary())).collect(),
            bank: match self.settings.budget {
                BudgetPolicy::CarriedBank { .. } => {
                    (0..transfers).map(|_| problem.add(variable().min(0))).collect()
                }
                _ => Vec::new(),
            },
            boost: if self.settings.bench_boost {
                (0..transfers).map(|_| problem.add(binary())).collect()
            } else {
                Vec::new()
            },
            bench: VarTable::new(
                &mut problem,
                n,
                if self.settings.bench_boost { transfers } else { 0 },
                binary,
            ),
        };
        debug!(
            "plan model: {} assets x {} periods, {} transfer periods",
            n, horizon, transfers
        );

        let objective = self.objective(&vars, &index);
        let mut constraints = Vec::new();
        self.squad_constraints(&vars, &mut constraints);
        self.lineup_constraints(&vars, &mut constraints);
        self.transfer_constraints(&vars, &mut constraints);
        self.budget_constraints(&vars, &mut constraints);
        self.bench_boost_constraints(&vars, &mut constraints);

        let solution = maximise(problem, objective, constraints, time_limit, "transfer planner")?;
        let plan = self.extract(&vars, &index, &solution);
        info!(
            "plan objective {:.2}, {} transfers, {} hits",
            plan.objective,
            plan.total_transfers(),
            plan.total_hits
        );
        Ok(plan)
    }

    fn objective(&self, vars: &PlanVars, index: &AssetIndex) -> Expression {
        let n = index.len();
        let horizon = self.periods.len();
        let first = self.first_transfer();
        let weights = tie_break_weights(index.ids(), 4 * horizon, self.tie_break);

        let mut terms: Vec<(f64, Variable)> = Vec::new();
        for i in 0..n {
            for t in 0..horizon {
                let s = self.points[i][t];
                terms.push((s + weights[i], vars.start.get(i, t)));
                terms.push((s + weights[i], vars.captain.get(i, t)));
                terms.push((weights[i], vars.vice.get(i, t)));
                terms.push((weights[i], vars.own.get(i, t)));
            }
            if self.settings.bench_boost {
                for k in 0..self.transfer_columns() {
                    terms.push((self.points[i][first + k], vars.bench.get(i, k)));
                }
            }
            if self.tie_break == TieBreak::LowestId {
                // Outweighs any tie-break gain a transfer could buy.
                for k in 0..self.transfer_columns() {
                    terms.push((-TIE_BREAK_BUDGET, vars.buy.get(i, k)));
                }
            }
        }
        for &h in &vars.hits {
            terms.push((-self.rules.hit_cost, h));
        }
        weighted_sum(terms)
    }

    /// Size, quotas and team cap in every period, plus the pinned initial
    /// squad when the first period is played as-is.
    fn squad_constraints(&self, vars: &PlanVars, out: &mut Vec<Constraint>) {
        let n = self.assets.len();
        let mut teams: BTreeMap<TeamId, Vec<usize>> = BTreeMap::new();
        for (i, asset) in self.assets.iter().enumerate() {
            teams.entry(asset.team).or_default().push(i);
        }

        for t in 0..self.periods.len() {
            out.push(eq(
                total(vars.own.column(t)),
                constant(self.rules.squad_size as f64),
            ));
            for (position, &quota) in self.rules.squad_quota.iter() {
                let members = (0..n)
                    .filter(|&i| self.assets[i].position == position)
                    .map(|i| vars.own.get(i, t));
                out.push(leq(total(members), constant(quota as f64)));
            }
            for rows in teams.values() {
                out.push(leq(
                    total(rows.iter().map(|&i| vars.own.get(i, t))),
                    constant(self.rules.team_cap as f64),
                ));
            }
        }

        if self.settings.first_period == FirstPeriod::AsIs {
            for i in 0..n {
                let held = if self.initial[i] { 1.0 } else { 0.0 };
                out.push(eq(Expression::from(vars.own.get(i, 0)), constant(held)));
            }
        }
    }

    fn lineup_constraints(&self, vars: &PlanVars, out: &mut Vec<Constraint>) {
        let n = self.assets.len();
        for t in 0..self.periods.len() {
            out.push(eq(
                total(vars.start.column(t)),
                constant(self.rules.lineup_size as f64),
            ));
            for (position, bounds) in self.rules.formation.iter() {
                let rows: Vec<usize> = (0..n)
                    .filter(|&i| self.assets[i].position == position)
                    .collect();
                let starters = || total(rows.iter().map(|&i| vars.start.get(i, t)));
                out.push(geq(starters(), constant(bounds.min as f64)));
                out.push(leq(starters(), constant(bounds.max as f64)));
            }
            out.push(eq(total(vars.captain.column(t)), constant(1.0)));
            out.push(eq(total(vars.vice.column(t)), constant(1.0)));
            for i in 0..n {
                let own = vars.own.get(i, t);
                let start = vars.start.get(i, t);
                let captain = vars.captain.get(i, t);
                let vice = vars.vice.get(i, t);
                out.push(leq(Expression::from(start), Expression::from(own)));
                out.push(leq(Expression::from(captain), Expression::from(start)));
                out.push(leq(Expression::from(vice), Expression::from(start)));
                out.push(leq(total([captain, vice]), constant(1.0)));
            }
        }
    }

    /// Continuity, transfer balance and the free-transfer ledger.
    fn transfer_constraints(&self, vars: &PlanVars, out: &mut Vec<Constraint>) {
        let n = self.assets.len();
        let first = self.first_transfer();
        let cap = f64::from(self.rules.max_free_transfers);

        for k in 0..self.transfer_columns() {
            let t = first + k;
            for i in 0..n {
                let buy = vars.buy.get(i, k);
                let sell = vars.sell.get(i, k);
                // own[t] - own[t-1] + sell - buy = 0
                let (lhs, rhs) = if t == 0 {
                    let held = if self.initial[i] { 1.0 } else { 0.0 };
                    (
                        weighted_sum([(1.0, vars.own.get(i, t)), (1.0, sell), (-1.0, buy)]),
                        held,
                    )
                } else {
                    (
                        weighted_sum([
                            (1.0, vars.own.get(i, t)),
                            (-1.0, vars.own.get(i, t - 1)),
                            (1.0, sell),
                            (-1.0, buy),
                        ]),
                        0.0,
                    )
                };
                out.push(eq(lhs, constant(rhs)));
                out.push(leq(total([buy, sell]), constant(1.0)));
                if self.settings.block_unavailable_buys
                    && self.assets[i].availability.is_unavailable()
                {
                    out.push(eq(Expression::from(buy), constant(0.0)));
                }
            }

            out.push(eq(total(vars.buy.column(k)), total(vars.sell.column(k))));
            out.push(eq(
                total(vars.buy.column(k)),
                total([vars.used[k], vars.hits[k]]),
            ));
            out.push(leq(
                Expression::from(vars.used[k]),
                Expression::from(vars.free[k]),
            ));

            if k == 0 {
                out.push(eq(
                    Expression::from(vars.free[0]),
                    constant(f64::from(self.settings.initial_free_transfers)),
                ));
            } else {
                // free[k] = min(cap, free[k-1] - used[k-1] + 1)
                let capped = vars.capped[k - 1];
                out.push(eq(
                    weighted_sum([
                        (1.0, vars.free[k]),
                        (-1.0, vars.free[k - 1]),
                        (1.0, vars.used[k - 1]),
                        (1.0, capped),
                    ]),
                    constant(1.0),
                ));
                out.push(geq(
                    Expression::from(vars.free[k]),
                    weighted_sum([(cap, capped)]),
                ));
            }
        }
    }

    fn budget_constraints(&self, vars: &PlanVars, out: &mut Vec<Constraint>) {
        let n = self.assets.len();
        // Purchases minus sales in transfer column `k`, in tenths.
        let net_spend = |k: usize| -> Vec<(f64, Variable)> {
            (0..n)
                .flat_map(|i| {
                    [
                        (self.price(i), vars.buy.get(i, k)),
                        (-self.price(i), vars.sell.get(i, k)),
                    ]
                })
                .collect()
        };

        match self.settings.budget {
            BudgetPolicy::FlatCap { cap } => {
                for t in 0..self.periods.len() {
                    out.push(leq(
                        weighted_sum((0..n).map(|i| (self.price(i), vars.own.get(i, t)))),
                        constant(f64::from(cap.tenths())),
                    ));
                }
            }
            BudgetPolicy::RollingBank { bank } => {
                for k in 0..self.transfer_columns() {
                    let injection = if k == 0 { f64::from(bank.tenths()) } else { 0.0 };
                    out.push(leq(weighted_sum(net_spend(k)), constant(injection)));
                }
            }
            BudgetPolicy::CarriedBank { bank } => {
                for k in 0..self.transfer_columns() {
                    // bank[k] - bank[k-1] + purchases - sales = 0
                    let mut terms = net_spend(k);
                    terms.push((1.0, vars.bank[k]));
                    let opening = if k == 0 {
                        f64::from(bank.tenths())
                    } else {
                        terms.push((-1.0, vars.bank[k - 1]));
                        0.0
                    };
                    out.push(eq(weighted_sum(terms), constant(opening)));
                }
            }
        }
    }

    fn bench_boost_constraints(&self, vars: &PlanVars, out: &mut Vec<Constraint>) {
        if !self.settings.bench_boost {
            return;
        }
        let first = self.first_transfer();
        out.push(leq(total(vars.boost.iter().copied()), constant(1.0)));
        for k in 0..self.transfer_columns() {
            let t = first + k;
            let boost = vars.boost[k];
            for i in 0..self.assets.len() {
                let bench = vars.bench.get(i, k);
                let own = vars.own.get(i, t);
                let start = vars.start.get(i, t);
                // bench = own AND NOT start AND boost
                out.push(leq(
                    weighted_sum([(1.0, bench), (-1.0, own), (1.0, start)]),
                    constant(0.0),
                ));
                out.push(leq(Expression::from(bench), Expression::from(boost)));
                out.push(leq(
                    weighted_sum([(1.0, own), (-1.0, start), (1.0, boost), (-1.0, bench)]),
                    constant(1.0),
                ));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    /// Walk periods in order, deriving transfers from consecutive resolved
    /// squads and recomputing the ledger, bank and scores algebraically.
    fn extract(
        &self,
        vars: &PlanVars,
        index: &AssetIndex,
        solution: &impl Solution,
    ) -> TransferPlan {
        let n = index.len();
        let first = self.first_transfer();
        let cap = self.rules.max_free_transfers;
        let set = |table: &VarTable, i: usize, t: usize| is_set(solution.value(table.get(i, t)));
        let by_position = |rows: &mut Vec<usize>| {
            rows.sort_by_key(|&i| (self.assets[i].position, self.assets[i].id));
        };

        let mut previous = self.initial.clone();
        let mut free = self.settings.initial_free_transfers;
        let mut bank = match self.settings.budget {
            BudgetPolicy::CarriedBank { bank } => Some(i64::from(bank.tenths())),
            _ => None,
        };
        let mut periods = Vec::with_capacity(self.periods.len());
        let mut total_hits = 0;
        let mut bench_boost_period = None;

        for (t, &period) in self.periods.iter().enumerate() {
            let mut squad: Vec<usize> = (0..n).filter(|&i| set(&vars.own, i, t)).collect();
            by_position(&mut squad);
            let mut starters: Vec<usize> =
                squad.iter().copied().filter(|&i| set(&vars.start, i, t)).collect();
            by_position(&mut starters);
            let mut bench: Vec<usize> = squad
                .iter()
                .copied()
                .filter(|i| !starters.contains(i))
                .collect();
            bench.sort_by(|&a, &b| {
                self.points[b][t]
                    .total_cmp(&self.points[a][t])
                    .then(self.assets[a].id.cmp(&self.assets[b].id))
            });
            let captain = starters
                .iter()
                .copied()
                .find(|&i| set(&vars.captain, i, t))
                .unwrap_or(starters[0]);
            let vice = starters
                .iter()
                .copied()
                .find(|&i| set(&vars.vice, i, t))
                .unwrap_or(starters[0]);

            let transfer_period = t >= first;
            let owned: Vec<bool> = (0..n).map(|i| squad.contains(&i)).collect();
            let (incoming, outgoing): (Vec<usize>, Vec<usize>) = if transfer_period {
                (
                    (0..n).filter(|&i| owned[i] && !previous[i]).collect(),
                    (0..n).filter(|&i| previous[i] && !owned[i]).collect(),
                )
            } else {
                (Vec::new(), Vec::new())
            };

            let mut free_used = 0;
            let mut hits = 0;
            let mut boosted = false;
            if transfer_period {
                let bought = incoming.len() as u32;
                free_used = bought.min(free);
                hits = bought - free_used;
                free = (free - free_used + 1).min(cap);
                if let Some(balance) = bank.as_mut() {
                    let value = |rows: &[usize]| -> i64 {
                        rows.iter()
                            .map(|&i| i64::from(self.assets[i].price.tenths()))
                            .sum()
                    };
                    *balance += value(&outgoing) - value(&incoming);
                }
                if self.settings.bench_boost {
                    boosted = is_set(solution.value(vars.boost[t - first]));
                }
            }
            total_hits += hits;
            if boosted && bench_boost_period.is_none() {
                bench_boost_period = Some(period);
            }

            let mut score: f64 = starters.iter().map(|&i| self.points[i][t]).sum::<f64>()
                + self.points[captain][t];
            if boosted {
                score += bench.iter().map(|&i| self.points[i][t]).sum::<f64>();
            }

            let ids = |rows: &[usize]| rows.iter().map(|&i| index.id(i)).collect::<Vec<_>>();
            let mut transfers_in = ids(&incoming);
            let mut transfers_out = ids(&outgoing);
            transfers_in.sort();
            transfers_out.sort();
            periods.push(PeriodPlan {
                period,
                squad: ids(&squad),
                starters: ids(&starters),
                bench: ids(&bench),
                captain: index.id(captain),
                vice_captain: index.id(vice),
                transfer_period,
                transfers_in,
                transfers_out,
                free_used,
                hits,
                free_transfers_next: free,
                bank: bank.map(|b| Price(u32::try_from(b.max(0)).unwrap_or(u32::MAX))),
                bench_boost: boosted,
                score,
            });
            previous = owned;
        }

        let objective = periods.iter().map(|p| p.score).sum::<f64>()
            - self.rules.hit_cost * f64::from(total_hits);
        TransferPlan {
            status: SolveStatus::Optimal,
            periods,
            total_hits,
            hit_cost: self.rules.hit_cost,
            objective,
            bench_boost_period,
        }
    }
}
