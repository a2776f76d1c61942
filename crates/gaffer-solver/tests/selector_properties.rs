// Property tests for the single-period selectors.
//
// Small universes are solved both by the MIP and by exhaustive enumeration,
// so optimality is checked rather than assumed.

use std::collections::HashMap;

use gaffer_core::{
    Asset, AssetId, GameRules, PeriodId, Position, PositionMap, Price, ScoreTable, TeamId,
};
use gaffer_solver::{
    select_lineup, select_squad, SelectorSettings, SolveError, SolveOptions, SolveStatus,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const P: PeriodId = PeriodId(1);

// ===========================================================================
// Test helpers
// ===========================================================================

/// Build assets from `(position, price tenths, team, score)` rows, ids from 1.
fn build(rows: &[(Position, u32, u32, f64)]) -> (Vec<Asset>, ScoreTable) {
    let mut assets = Vec::new();
    let mut scores = ScoreTable::new();
    for (i, &(position, price, team, score)) in rows.iter().enumerate() {
        let id = i as u32 + 1;
        assets.push(Asset::new(id, &format!("A{id}"), position, team, Price(price)));
        scores.insert(AssetId(id), P, score);
    }
    (assets, scores)
}

/// Deterministic universe with `counts` assets per position and teams that
/// make the cap bind for some combinations.
fn formula_universe(counts: [usize; 4]) -> (Vec<Asset>, ScoreTable) {
    let mut rows = Vec::new();
    let mut i = 1u32;
    for (position, &count) in Position::ALL.iter().zip(counts.iter()) {
        for _ in 0..count {
            let price = match position {
                Position::Keeper => 40 + (i * 3 % 4) * 5,
                Position::Defender => 40 + (i * 7 % 6) * 5,
                Position::Midfielder => 50 + (i * 5 % 11) * 5,
                Position::Forward => 60 + (i * 13 % 7) * 5,
            };
            let score = f64::from(i * 37 % 101) / 10.0;
            rows.push((*position, price, i % 6 + 1, score));
            i += 1;
        }
    }
    build(&rows)
}

fn combinations(items: &[usize], k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if items.len() < k {
        return Vec::new();
    }
    let mut out = Vec::new();
    for (pos, &first) in items.iter().enumerate() {
        for mut rest in combinations(&items[pos + 1..], k - 1) {
            rest.insert(0, first);
            out.push(rest);
        }
    }
    out
}

/// Every squad satisfying quotas and the team cap, ignoring budget.
fn legal_squads(assets: &[Asset], rules: &GameRules) -> Vec<Vec<usize>> {
    let mut partial: Vec<Vec<usize>> = vec![Vec::new()];
    for position in Position::ALL {
        let group: Vec<usize> = (0..assets.len())
            .filter(|&i| assets[i].position == position)
            .collect();
        let picks = combinations(&group, rules.quota(position));
        let mut next = Vec::new();
        for base in &partial {
            for pick in &picks {
                let mut squad = base.clone();
                squad.extend(pick);
                next.push(squad);
            }
        }
        partial = next;
    }
    partial
        .into_iter()
        .filter(|squad| {
            let mut per_team: HashMap<TeamId, usize> = HashMap::new();
            for &i in squad {
                *per_team.entry(assets[i].team).or_default() += 1;
            }
            per_team.values().all(|&n| n <= rules.team_cap)
        })
        .collect()
}

fn squad_price(assets: &[Asset], squad: &[usize]) -> Price {
    squad.iter().map(|&i| assets[i].price).sum()
}

/// Best total score within budget by enumeration, if any squad fits.
fn brute_force_best(assets: &[Asset], scores: &ScoreTable, rules: &GameRules) -> Option<f64> {
    legal_squads(assets, rules)
        .into_iter()
        .filter(|s| squad_price(assets, s) <= rules.budget)
        .map(|s| s.iter().map(|&i| scores.get(assets[i].id, P).unwrap()).sum::<f64>())
        .max_by(f64::total_cmp)
}

fn solve(
    assets: &[Asset],
    scores: &ScoreTable,
    rules: &GameRules,
) -> Result<gaffer_solver::SquadSelection, SolveError> {
    select_squad(
        assets,
        scores,
        P,
        rules,
        SelectorSettings::default(),
        &SolveOptions::default(),
    )
}

fn assert_valid_squad(sel: &gaffer_solver::SquadSelection, rules: &GameRules) {
    assert_eq!(sel.squad.len(), rules.squad_size);
    assert!(sel.total_price <= rules.budget);
    assert_eq!(
        PositionMap::count(sel.squad.iter().map(|a| a.position)),
        rules.squad_quota
    );
    let mut per_team: HashMap<TeamId, usize> = HashMap::new();
    for a in &sel.squad {
        *per_team.entry(a.team).or_default() += 1;
    }
    assert!(per_team.values().all(|&n| n <= rules.team_cap));
}

// ===========================================================================
// Squad selector
// ===========================================================================

#[test]
fn selector_matches_exhaustive_search() {
    let (assets, scores) = formula_universe([4, 7, 6, 3]);
    for budget in [Price(800), Price(900), Price(1000)] {
        let rules = GameRules {
            budget,
            ..GameRules::default()
        };
        let expected = brute_force_best(&assets, &scores, &rules);
        match (solve(&assets, &scores, &rules), expected) {
            (Ok(sel), Some(best)) => {
                assert_valid_squad(&sel, &rules);
                assert!(
                    (sel.total_score - best).abs() < 1e-6,
                    "budget {budget}: solver {} vs enumeration {best}",
                    sel.total_score
                );
            }
            (Err(e), None) => assert_eq!(e.status(), Some(SolveStatus::Infeasible)),
            (got, want) => panic!("budget {budget}: solver {got:?} vs enumeration {want:?}"),
        }
    }
}

#[test]
fn two_forward_universe_is_infeasible() {
    // 4 keepers 4.0-5.5, 8 defenders 4.0-6.5, 6 midfielders 5.0-10.0 and
    // only 2 forwards 6.0-9.0 cannot fill a three-forward quota.
    let mut rows = Vec::new();
    for (i, price) in [40, 45, 50, 55].into_iter().enumerate() {
        rows.push((Position::Keeper, price, i as u32 + 1, 3.0 + i as f64 * 0.1));
    }
    for (i, price) in [40, 45, 45, 50, 55, 60, 60, 65].into_iter().enumerate() {
        rows.push((Position::Defender, price, i as u32 + 1, 3.5 + i as f64 * 0.2));
    }
    for (i, price) in [50, 60, 70, 80, 90, 100].into_iter().enumerate() {
        rows.push((Position::Midfielder, price, i as u32 + 1, 4.0 + i as f64 * 0.5));
    }
    for (i, price) in [60, 90].into_iter().enumerate() {
        rows.push((Position::Forward, price, i as u32 + 3, 5.0 + i as f64));
    }
    let (assets, scores) = build(&rows);
    assert_eq!(assets.len(), 20);

    let err = solve(&assets, &scores, &GameRules::default()).unwrap_err();
    assert_eq!(err.status(), Some(SolveStatus::Infeasible));
    assert_eq!(err.to_string(), "MIP status: Infeasible");
}

#[test]
fn exact_cheapest_budget_is_feasible_and_one_tenth_less_is_not() {
    let (assets, scores) = formula_universe([4, 7, 6, 3]);
    let cheapest = legal_squads(&assets, &GameRules::default())
        .iter()
        .map(|s| squad_price(&assets, s))
        .min()
        .unwrap();

    let rules = GameRules {
        budget: cheapest,
        ..GameRules::default()
    };
    let sel = solve(&assets, &scores, &rules).unwrap();
    assert_eq!(sel.status, SolveStatus::Optimal);
    assert_eq!(sel.total_price, cheapest);

    let rules = GameRules {
        budget: Price(cheapest.tenths() - 1),
        ..GameRules::default()
    };
    let err = solve(&assets, &scores, &rules).unwrap_err();
    assert_eq!(err.status(), Some(SolveStatus::Infeasible));
}

#[test]
fn objective_never_drops_as_budget_grows() {
    let mut rng = StdRng::seed_from_u64(0x6166_6572);
    for trial in 0..6 {
        let mut rows = Vec::new();
        for (position, count) in Position::ALL.into_iter().zip([4, 7, 6, 4]) {
            for _ in 0..count {
                rows.push((
                    position,
                    40 + rng.gen_range(0..13u32) * 5,
                    rng.gen_range(1..=6u32),
                    f64::from(rng.gen_range(0..100u32)) / 10.0,
                ));
            }
        }
        let (assets, scores) = build(&rows);

        let mut previous = f64::NEG_INFINITY;
        for tenths in [650, 750, 850, 1000] {
            let rules = GameRules {
                budget: Price(tenths),
                ..GameRules::default()
            };
            let value = match solve(&assets, &scores, &rules) {
                Ok(sel) => {
                    assert_valid_squad(&sel, &rules);
                    sel.total_score
                }
                Err(e) => {
                    assert_eq!(e.status(), Some(SolveStatus::Infeasible));
                    f64::NEG_INFINITY
                }
            };
            let expected = brute_force_best(&assets, &scores, &rules).unwrap_or(f64::NEG_INFINITY);
            if expected.is_finite() {
                assert!((value - expected).abs() < 1e-6, "trial {trial} budget {tenths}");
            } else {
                assert!(value.is_infinite(), "trial {trial} budget {tenths}");
            }
            assert!(
                value >= previous - 1e-9,
                "trial {trial}: objective fell from {previous} to {value} at budget {tenths}"
            );
            previous = value;
        }
    }
}

#[test]
fn reselecting_gives_the_same_objective() {
    let (assets, scores) = formula_universe([4, 7, 6, 3]);
    // The cheapest legal squad here costs 94.0.
    let rules = GameRules {
        budget: Price(1000),
        ..GameRules::default()
    };
    let first = solve(&assets, &scores, &rules).unwrap();
    assert_eq!(first.status, SolveStatus::Optimal);
    assert!(first.total_price <= rules.budget);
    let second = solve(&assets, &scores, &rules).unwrap();
    assert!((first.total_score - second.total_score).abs() < 1e-9);
}

// ===========================================================================
// Lineup selector
// ===========================================================================

/// Best lineup value by enumerating every 11-of-15 subset.
fn brute_force_lineup(squad: &[Asset], scores: &ScoreTable, rules: &GameRules) -> f64 {
    let n = squad.len();
    let mut best = f64::NEG_INFINITY;
    for mask in 0u32..(1 << n) {
        if mask.count_ones() as usize != rules.lineup_size {
            continue;
        }
        let chosen: Vec<&Asset> = (0..n).filter(|i| mask & (1 << i) != 0).map(|i| &squad[i]).collect();
        let counts = PositionMap::count(chosen.iter().map(|a| a.position));
        if !rules
            .formation
            .iter()
            .all(|(pos, bounds)| bounds.contains(*counts.get(pos)))
        {
            continue;
        }
        let points: Vec<f64> = chosen.iter().map(|a| scores.get(a.id, P).unwrap()).collect();
        let value = points.iter().sum::<f64>() + points.iter().copied().fold(f64::MIN, f64::max);
        best = best.max(value);
    }
    best
}

#[test]
fn lineup_matches_exhaustive_search() {
    let rules = GameRules::default();
    for shift in [0u32, 5, 17] {
        let mut rows = Vec::new();
        let mut i = 1u32;
        for (position, count) in Position::ALL.into_iter().zip([2, 5, 5, 3]) {
            for _ in 0..count {
                let score = f64::from((i + shift) * 29 % 31) / 4.0;
                rows.push((position, 50, i, score));
                i += 1;
            }
        }
        let (squad, scores) = build(&rows);
        let lineup = select_lineup(&squad, &scores, P, &rules, &SolveOptions::default()).unwrap();
        let expected = brute_force_lineup(&squad, &scores, &rules);

        assert_eq!(lineup.status, SolveStatus::Optimal);
        assert_eq!(lineup.starters.len(), 11);
        assert_ne!(lineup.captain, lineup.vice_captain);
        assert!(lineup.starters.contains(&lineup.captain));
        assert!(lineup.starters.contains(&lineup.vice_captain));
        assert!(
            (lineup.objective - expected).abs() < 1e-6,
            "shift {shift}: solver {} vs enumeration {expected}",
            lineup.objective
        );
    }
}
