// Small deterministic asset pools for unit tests.

use gaffer_core::{Asset, GameRules, PeriodId, Position, Price, ScoreTable};

/// `counts` keepers, defenders, midfielders and forwards with ids from 1 in
/// that order, spread over eight teams so the default team cap never binds
/// for a 15-asset pool.
pub(crate) fn pool(counts: [usize; 4]) -> Vec<Asset> {
    let mut assets = Vec::new();
    let mut id = 1u32;
    for (position, &count) in Position::ALL.iter().zip(counts.iter()) {
        let base = match position {
            Position::Keeper => 40,
            Position::Defender => 40,
            Position::Midfielder => 50,
            Position::Forward => 60,
        };
        for _ in 0..count {
            let price = Price(base + (id * 7 % 10) * 5);
            assets.push(Asset::new(
                id,
                &format!("{}{}", position.display_str(), id),
                *position,
                id % 8 + 1,
                price,
            ));
            id += 1;
        }
    }
    assets
}

/// Default rules with a budget every squad drawn from a small `pool` fits.
///
/// Pool prices average about 7.0, so the default 100.0 budget is too tight
/// whenever the selector has little or no choice.
pub(crate) fn roomy_rules() -> GameRules {
    GameRules {
        budget: Price(1200),
        ..GameRules::default()
    }
}

/// Distinct per-asset score, identical in every period.
pub(crate) fn score_of(asset: &Asset) -> f64 {
    2.0 + f64::from(asset.id.0 * 14 % 23) * 0.25
}

pub(crate) fn flat_scores(assets: &[Asset], periods: &[PeriodId]) -> ScoreTable {
    assets
        .iter()
        .flat_map(|a| periods.iter().map(move |&p| (a.id, p, score_of(a))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roomy_budget_covers_the_priciest_small_pools() {
        let rules = roomy_rules();
        for counts in [[2, 5, 5, 3], [2, 5, 5, 4], [2, 5, 6, 3], [3, 6, 6, 4]] {
            let assets = pool(counts);
            let extras = assets.len() - rules.squad_size;
            let mut prices: Vec<Price> = assets.iter().map(|a| a.price).collect();
            prices.sort();
            let priciest_squad: Price = prices[extras..].iter().copied().sum();
            assert!(priciest_squad <= rules.budget, "{counts:?} costs {priciest_squad}");
        }
    }
}
