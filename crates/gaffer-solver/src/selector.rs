// Single-period squad selector: the best-scoring legal squad from scratch.

use good_lp::constraint::{eq, leq};
use good_lp::{variable, Constraint, ProblemVariables, Solution};
use std::collections::BTreeMap;
use tracing::info;

use gaffer_core::{Asset, GameRules, PeriodId, Price, ScoreTable, TeamId};

use crate::model::{
    constant, is_set, maximise, tie_break_weights, total, weighted_sum, AssetIndex, SolveError,
    SolveOptions, SolveStatus, VarTable,
};
use crate::plan::SquadSelection;
use crate::validate::{check_scores, index_universe};

/// Selector-only knobs layered on top of the game rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorSettings {
    /// Also force doubtful assets out, not only unavailable ones.
    pub exclude_doubtful: bool,
}

/// Choose `rules.squad_size` assets maximising total forecast for `period`
/// under the budget, exact positional quotas and the team cap.
///
/// Unavailable assets are never selected. Returns `NotOptimal` rather than a
/// partial squad when no legal squad exists.
pub fn select_squad(
    assets: &[Asset],
    scores: &ScoreTable,
    period: PeriodId,
    rules: &GameRules,
    settings: SelectorSettings,
    options: &SolveOptions,
) -> Result<SquadSelection, SolveError> {
    rules.validate().map_err(crate::InputError::from)?;
    index_universe(assets)?;
    check_scores(assets, scores, &[period])?;

    info!(
        "selecting squad for period {} from {} assets, budget {}",
        period,
        assets.len(),
        rules.budget
    );

    let point: Vec<f64> = assets
        .iter()
        .map(|a| scores.get(a.id, period).unwrap_or(0.0))
        .collect();

    let index = AssetIndex::new(assets.iter().map(|a| a.id).collect());
    let weights = tie_break_weights(index.ids(), 1, options.tie_break);

    let mut problem = ProblemVariables::new();
    let pick = VarTable::new(&mut problem, index.len(), 1, || variable().binary());
    let x = |i: usize| pick.get(i, 0);

    let objective = weighted_sum((0..index.len()).map(|i| (point[i] + weights[i], x(i))));

    let mut constraints: Vec<Constraint> = Vec::new();
    constraints.push(eq(total(pick.column(0)), constant(rules.squad_size as f64)));
    constraints.push(leq(
        weighted_sum((0..index.len()).map(|i| (f64::from(assets[i].price.tenths()), x(i)))),
        constant(f64::from(rules.budget.tenths())),
    ));
    for (position, &quota) in rules.squad_quota.iter() {
        let members = (0..index.len()).filter(|&i| assets[i].position == position);
        constraints.push(eq(total(members.map(x)), constant(quota as f64)));
    }
    let mut teams: BTreeMap<TeamId, Vec<usize>> = BTreeMap::new();
    for (i, asset) in assets.iter().enumerate() {
        teams.entry(asset.team).or_default().push(i);
    }
    for rows in teams.values() {
        constraints.push(leq(
            total(rows.iter().map(|&i| x(i))),
            constant(rules.team_cap as f64),
        ));
    }
    for (i, asset) in assets.iter().enumerate() {
        let excluded = asset.availability.is_unavailable()
            || (settings.exclude_doubtful && !asset.availability.is_available());
        if excluded {
            constraints.push(eq(x(i), constant(0.0)));
        }
    }

    let solution = maximise(
        problem,
        objective,
        constraints,
        options.time_limit,
        "squad selector",
    )?;

    let mut squad: Vec<(Asset, f64)> = (0..index.len())
        .filter(|&i| is_set(solution.value(x(i))))
        .map(|i| (assets[i].clone(), point[i]))
        .collect();
    squad.sort_by_key(|(a, _)| (a.position, a.id));
    let total_price: Price = squad.iter().map(|(a, _)| a.price).sum();
    let total_score = squad.iter().map(|(_, s)| s).sum();
    info!(
        "selected squad: price {}, score {:.2}",
        total_price, total_score
    );
    Ok(SquadSelection {
        status: SolveStatus::Optimal,
        period,
        squad: squad.into_iter().map(|(a, _)| a).collect(),
        total_price,
        total_score,
    })
}
