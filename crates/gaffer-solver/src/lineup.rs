// Starting-lineup selector: best starters, captain and vice-captain for a
// fixed squad.

use good_lp::constraint::{eq, geq, leq};
use good_lp::{variable, Constraint, Expression, ProblemVariables, Solution};
use tracing::info;

use gaffer_core::{Asset, AssetId, GameRules, PeriodId, ScoreTable};

use crate::model::{
    constant, is_set, maximise, tie_break_weights, total, weighted_sum, AssetIndex, SolveError,
    SolveOptions, SolveStatus, VarTable,
};
use crate::plan::LineupSelection;
use crate::validate::{check_quotas, check_scores, index_universe, resolve_squad};

/// Pick `rules.lineup_size` starters within the formation bounds plus a
/// captain and vice-captain, maximising starters' scores with the captain
/// counted twice.
pub fn select_lineup(
    squad: &[Asset],
    scores: &ScoreTable,
    period: PeriodId,
    rules: &GameRules,
    options: &SolveOptions,
) -> Result<LineupSelection, SolveError> {
    rules.validate().map_err(crate::InputError::from)?;
    let by_id = index_universe(squad)?;
    let ids: Vec<AssetId> = squad.iter().map(|a| a.id).collect();
    let members = resolve_squad(&ids, &by_id, rules)?;
    check_quotas(&members, rules)?;
    check_scores(squad, scores, &[period])?;

    let point: Vec<f64> = squad
        .iter()
        .map(|a| scores.get(a.id, period).unwrap_or(0.0))
        .collect();

    let index = AssetIndex::new(squad.iter().map(|a| a.id).collect());
    let n = index.len();
    let weights = tie_break_weights(index.ids(), 3, options.tie_break);

    let mut problem = ProblemVariables::new();
    let start = VarTable::new(&mut problem, n, 1, || variable().binary());
    let captain = VarTable::new(&mut problem, n, 1, || variable().binary());
    let vice = VarTable::new(&mut problem, n, 1, || variable().binary());

    let objective = weighted_sum((0..n).flat_map(|i| {
        [
            (point[i] + weights[i], start.get(i, 0)),
            (point[i] + weights[i], captain.get(i, 0)),
            (weights[i], vice.get(i, 0)),
        ]
    }));

    let mut constraints: Vec<Constraint> = Vec::new();
    constraints.push(eq(total(start.column(0)), constant(rules.lineup_size as f64)));
    for (position, bounds) in rules.formation.iter() {
        let rows: Vec<usize> = (0..n).filter(|&i| squad[i].position == position).collect();
        let starters = || total(rows.iter().map(|&i| start.get(i, 0)));
        constraints.push(geq(starters(), constant(bounds.min as f64)));
        constraints.push(leq(starters(), constant(bounds.max as f64)));
    }
    constraints.push(eq(total(captain.column(0)), constant(1.0)));
    constraints.push(eq(total(vice.column(0)), constant(1.0)));
    for i in 0..n {
        let s = start.get(i, 0);
        let c = captain.get(i, 0);
        let v = vice.get(i, 0);
        constraints.push(leq(Expression::from(c), Expression::from(s)));
        constraints.push(leq(Expression::from(v), Expression::from(s)));
        constraints.push(leq(total([c, v]), constant(1.0)));
    }

    let solution = maximise(
        problem,
        objective,
        constraints,
        options.time_limit,
        "lineup selector",
    )?;

    let mut starters: Vec<usize> = (0..n)
        .filter(|&i| is_set(solution.value(start.get(i, 0))))
        .collect();
    starters.sort_by_key(|&i| (squad[i].position, squad[i].id));
    let mut bench: Vec<usize> = (0..n).filter(|i| !starters.contains(i)).collect();
    bench.sort_by(|&a, &b| point[b].total_cmp(&point[a]).then(squad[a].id.cmp(&squad[b].id)));
    let pick_one = |table: &VarTable| {
        (0..n)
            .find(|&i| is_set(solution.value(table.get(i, 0))))
            .ok_or_else(|| SolveError::NotOptimal {
                status: SolveStatus::SolverError,
                detail: "no armband holder in solution".into(),
            })
    };
    let cap = pick_one(&captain)?;
    let vc = pick_one(&vice)?;

    let objective = starters.iter().map(|&i| point[i]).sum::<f64>() + point[cap];
    info!(
        "lineup for period {}: captain {} vice {} objective {:.2}",
        period, squad[cap].name, squad[vc].name, objective
    );
    Ok(LineupSelection {
        status: SolveStatus::Optimal,
        period,
        starters: starters.iter().map(|&i| index.id(i)).collect(),
        bench: bench.iter().map(|&i| index.id(i)).collect(),
        captain: index.id(cap),
        vice_captain: index.id(vc),
        objective,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use gaffer_core::{Position, PositionMap};

    const P: PeriodId = PeriodId(3);

    #[test]
    fn lineup_respects_formation_and_armbands() {
        let squad = fixtures::pool([2, 5, 5, 3]);
        let scores = fixtures::flat_scores(&squad, &[P]);
        let rules = GameRules::default();
        let lineup =
            select_lineup(&squad, &scores, P, &rules, &SolveOptions::default()).unwrap();

        assert_eq!(lineup.starters.len(), 11);
        assert_eq!(lineup.bench.len(), 4);
        assert!(lineup.starters.contains(&lineup.captain));
        assert!(lineup.starters.contains(&lineup.vice_captain));
        assert_ne!(lineup.captain, lineup.vice_captain);

        let position_of = |id: AssetId| squad.iter().find(|a| a.id == id).map(|a| a.position);
        let counts = PositionMap::count(lineup.starters.iter().filter_map(|&id| position_of(id)));
        for (pos, bounds) in rules.formation.iter() {
            assert!(bounds.contains(*counts.get(pos)), "{pos} count {}", counts.get(pos));
        }
    }

    #[test]
    fn captain_is_top_scoring_starter() {
        let squad = fixtures::pool([2, 5, 5, 3]);
        let mut scores = fixtures::flat_scores(&squad, &[P]);
        let star = squad[9].id;
        scores.insert(star, P, 50.0);
        let lineup =
            select_lineup(&squad, &scores, P, &GameRules::default(), &SolveOptions::default())
                .unwrap();
        assert_eq!(lineup.captain, star);
        let expected: f64 = lineup
            .starters
            .iter()
            .map(|&id| scores.get(id, P).unwrap())
            .sum::<f64>()
            + 50.0;
        assert!((lineup.objective - expected).abs() < 1e-9);
    }

    #[test]
    fn only_one_keeper_starts_even_if_both_score_well() {
        let squad = fixtures::pool([2, 5, 5, 3]);
        let mut scores = fixtures::flat_scores(&squad, &[P]);
        scores.insert(squad[0].id, P, 30.0);
        scores.insert(squad[1].id, P, 29.0);
        let lineup =
            select_lineup(&squad, &scores, P, &GameRules::default(), &SolveOptions::default())
                .unwrap();
        let keepers = lineup
            .starters
            .iter()
            .filter(|id| squad.iter().any(|a| a.id == **id && a.position == Position::Keeper))
            .count();
        assert_eq!(keepers, 1);
        assert!(lineup.starters.contains(&squad[0].id));
        assert_eq!(lineup.bench[0], squad[1].id);
    }

    #[test]
    fn rejects_wrong_squad_shape() {
        let squad = fixtures::pool([2, 5, 5, 3]);
        let scores = fixtures::flat_scores(&squad, &[P]);
        let err = select_lineup(
            &squad[..14],
            &scores,
            P,
            &GameRules::default(),
            &SolveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SolveError::InvalidInput(crate::InputError::SquadSize { .. })
        ));

        let lopsided = fixtures::pool([3, 4, 5, 3]);
        let scores = fixtures::flat_scores(&lopsided, &[P]);
        let err = select_lineup(
            &lopsided,
            &scores,
            P,
            &GameRules::default(),
            &SolveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SolveError::InvalidInput(crate::InputError::QuotaViolation { .. })
        ));
    }

    #[test]
    fn lowest_id_picks_lower_captain_on_ties() {
        let squad = fixtures::pool([2, 5, 5, 3]);
        let mut scores = fixtures::flat_scores(&squad, &[P]);
        scores.insert(squad[12].id, P, 40.0);
        scores.insert(squad[6].id, P, 40.0);
        let lineup = select_lineup(
            &squad,
            &scores,
            P,
            &GameRules::default(),
            &SolveOptions {
                tie_break: crate::TieBreak::LowestId,
                ..SolveOptions::default()
            },
        )
        .unwrap();
        assert_eq!(lineup.captain, squad[6].id);
        assert!(lineup.starters.contains(&squad[12].id));
    }
}
