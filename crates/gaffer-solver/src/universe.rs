// Candidate-universe pruning: keeps planning models small by only offering
// the owned squad plus the strongest alternatives per position.

use std::collections::HashSet;
use tracing::debug;

use gaffer_core::{Asset, AssetId, Horizon, Position, ScoreTable};

use crate::validate::InputError;

/// The initial squad plus the `per_position` best non-owned, not-unavailable
/// assets per position by total forecast over `horizon`. Ties go to the
/// lower id. Output is ordered by id.
pub fn candidate_universe(
    assets: &[Asset],
    scores: &ScoreTable,
    horizon: &Horizon,
    initial_squad: &[AssetId],
    per_position: usize,
) -> Result<Vec<Asset>, InputError> {
    let owned: HashSet<AssetId> = initial_squad.iter().copied().collect();
    for id in initial_squad {
        if !assets.iter().any(|a| a.id == *id) {
            return Err(InputError::UnknownAsset(*id));
        }
    }

    let mut selected: Vec<Asset> = assets
        .iter()
        .filter(|a| owned.contains(&a.id))
        .cloned()
        .collect();

    for position in Position::ALL {
        let mut pool: Vec<(&Asset, f64)> = assets
            .iter()
            .filter(|a| {
                a.position == position
                    && !owned.contains(&a.id)
                    && !a.availability.is_unavailable()
            })
            .map(|a| (a, scores.window_total(a.id, horizon.periods())))
            .collect();
        pool.sort_by(|(a, sa), (b, sb)| sb.total_cmp(sa).then(a.id.cmp(&b.id)));
        selected.extend(pool.into_iter().take(per_position).map(|(a, _)| a.clone()));
    }

    selected.sort_by_key(|a| a.id);
    selected.dedup_by_key(|a| a.id);
    debug!(
        "candidate universe: {} of {} assets ({} owned)",
        selected.len(),
        assets.len(),
        owned.len()
    );
    Ok(selected)
}
