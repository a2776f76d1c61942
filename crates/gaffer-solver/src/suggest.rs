// Greedy like-for-like transfer suggestions. A quick heuristic alongside the
// planner, not an optimizer: each of the weakest squad members is paired with
// the best affordable same-position replacement.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use gaffer_core::{Asset, AssetId, GameRules, HorizonError, PeriodId, ScoreTable, TeamId};

use crate::plan::Suggestion;
use crate::validate::{index_universe, resolve_squad, InputError};

/// Suggest up to `count` single swaps for the weakest squad members over
/// `periods`.
///
/// A replacement must play the same position, cost no more than the asset
/// it replaces, not be unavailable and keep every team within the cap once
/// earlier suggestions are applied. Only positive gains are reported.
pub fn suggest_transfers(
    squad: &[AssetId],
    assets: &[Asset],
    scores: &ScoreTable,
    periods: &[PeriodId],
    count: usize,
    rules: &GameRules,
) -> Result<Vec<Suggestion>, InputError> {
    if periods.is_empty() {
        return Err(InputError::Horizon(HorizonError::Empty));
    }
    let by_id = index_universe(assets)?;
    let members = resolve_squad(squad, &by_id, rules)?;
    let window = |a: &Asset| scores.window_total(a.id, periods);

    let mut per_team: HashMap<TeamId, usize> = HashMap::new();
    for a in &members {
        *per_team.entry(a.team).or_default() += 1;
    }
    let mut taken: HashSet<AssetId> = squad.iter().copied().collect();

    let mut weakest: Vec<(&Asset, f64)> = members.iter().map(|&a| (a, window(a))).collect();
    weakest.sort_by(|(a, sa), (b, sb)| sa.total_cmp(sb).then(a.id.cmp(&b.id)));

    let mut suggestions = Vec::new();
    for (out, out_total) in weakest.into_iter().take(count) {
        let best = assets
            .iter()
            .filter(|c| {
                c.position == out.position
                    && !taken.contains(&c.id)
                    && !c.availability.is_unavailable()
                    && c.price <= out.price
            })
            .filter(|c| {
                let current = per_team.get(&c.team).copied().unwrap_or(0);
                let freed = usize::from(c.team == out.team);
                current - freed < rules.team_cap
            })
            .map(|c| (c, window(c)))
            .max_by(|(a, sa), (b, sb)| sa.total_cmp(sb).then(b.id.cmp(&a.id)));

        let Some((incoming, in_total)) = best else {
            debug!("no replacement for {} ({})", out.name, out.id);
            continue;
        };
        let gain = in_total - out_total;
        if gain <= 0.0 {
            continue;
        }
        taken.insert(incoming.id);
        if let Some(n) = per_team.get_mut(&out.team) {
            *n -= 1;
        }
        *per_team.entry(incoming.team).or_default() += 1;
        suggestions.push(Suggestion {
            out: out.id,
            incoming: incoming.id,
            gain,
        });
    }
    Ok(suggestions)
}
