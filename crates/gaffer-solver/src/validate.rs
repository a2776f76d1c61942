// Precondition checks run before any model is built.

use std::collections::{HashMap, HashSet};

use gaffer_core::{
    Asset, AssetId, GameRules, HorizonError, PeriodId, Position, PositionMap, RulesError,
    ScoreTable, TeamId,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("asset universe is empty")]
    EmptyUniverse,

    #[error("asset {0} appears more than once")]
    DuplicateAsset(AssetId),

    #[error("asset {0} is not in the asset universe")]
    UnknownAsset(AssetId),

    #[error("squad has {found} assets, expected {expected}")]
    SquadSize { expected: usize, found: usize },

    #[error("squad has {found} {position} assets, quota is {quota}")]
    QuotaViolation {
        position: Position,
        found: usize,
        quota: usize,
    },

    #[error("squad has {found} assets from team {team}, cap is {cap}")]
    TeamCapViolation { team: TeamId, found: usize, cap: usize },

    #[error("no forecast score for asset {asset} in period {period}")]
    MissingScore { asset: AssetId, period: PeriodId },

    #[error("forecast score for asset {asset} in period {period} is not finite")]
    NonFiniteScore { asset: AssetId, period: PeriodId },

    #[error("invalid horizon: {0}")]
    Horizon(#[from] HorizonError),

    #[error("initial free transfers {found} exceed the cap of {cap}")]
    FreeTransfersAboveCap { found: u32, cap: u32 },

    #[error(transparent)]
    Rules(#[from] RulesError),
}

/// Index the universe by id, rejecting an empty universe and duplicate ids.
pub fn index_universe(assets: &[Asset]) -> Result<HashMap<AssetId, &Asset>, InputError> {
    if assets.is_empty() {
        return Err(InputError::EmptyUniverse);
    }
    let mut by_id = HashMap::with_capacity(assets.len());
    for asset in assets {
        if by_id.insert(asset.id, asset).is_some() {
            return Err(InputError::DuplicateAsset(asset.id));
        }
    }
    Ok(by_id)
}

/// Every asset must carry a finite score for every period.
pub fn check_scores(
    assets: &[Asset],
    scores: &ScoreTable,
    periods: &[PeriodId],
) -> Result<(), InputError> {
    for asset in assets {
        for &period in periods {
            match scores.get(asset.id, period) {
                None => {
                    return Err(InputError::MissingScore {
                        asset: asset.id,
                        period,
                    })
                }
                Some(s) if !s.is_finite() => {
                    return Err(InputError::NonFiniteScore {
                        asset: asset.id,
                        period,
                    })
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

/// Resolve squad ids against the universe, checking size and uniqueness.
pub fn resolve_squad<'a>(
    squad: &[AssetId],
    by_id: &HashMap<AssetId, &'a Asset>,
    rules: &GameRules,
) -> Result<Vec<&'a Asset>, InputError> {
    if squad.len() != rules.squad_size {
        return Err(InputError::SquadSize {
            expected: rules.squad_size,
            found: squad.len(),
        });
    }
    let mut seen = HashSet::with_capacity(squad.len());
    let mut members = Vec::with_capacity(squad.len());
    for &id in squad {
        if !seen.insert(id) {
            return Err(InputError::DuplicateAsset(id));
        }
        let asset = by_id.get(&id).ok_or(InputError::UnknownAsset(id))?;
        members.push(*asset);
    }
    Ok(members)
}

/// Positional quotas must be met exactly.
pub fn check_quotas(members: &[&Asset], rules: &GameRules) -> Result<(), InputError> {
    let counts = PositionMap::count(members.iter().map(|a| a.position));
    for (position, &found) in counts.iter() {
        let quota = rules.quota(position);
        if found != quota {
            return Err(InputError::QuotaViolation {
                position,
                found,
                quota,
            });
        }
    }
    Ok(())
}

pub fn check_team_cap(members: &[&Asset], rules: &GameRules) -> Result<(), InputError> {
    let mut per_team: HashMap<TeamId, usize> = HashMap::new();
    for asset in members {
        *per_team.entry(asset.team).or_default() += 1;
    }
    let mut worst: Vec<(TeamId, usize)> = per_team
        .into_iter()
        .filter(|&(_, n)| n > rules.team_cap)
        .collect();
    worst.sort();
    match worst.first() {
        Some(&(team, found)) => Err(InputError::TeamCapViolation {
            team,
            found,
            cap: rules.team_cap,
        }),
        None => Ok(()),
    }
}

/// Full squad invariant check: size, uniqueness, membership, quotas and
/// team cap.
pub fn check_squad<'a>(
    squad: &[AssetId],
    by_id: &HashMap<AssetId, &'a Asset>,
    rules: &GameRules,
) -> Result<Vec<&'a Asset>, InputError> {
    let members = resolve_squad(squad, by_id, rules)?;
    check_quotas(&members, rules)?;
    check_team_cap(&members, rules)?;
    Ok(members)
}
