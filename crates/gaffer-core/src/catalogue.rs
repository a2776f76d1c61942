// Asset catalogue and forecast score loading.
//
// Reads FPL-style CSV exports: an asset file keyed by element id with
// `element_type`, `team` and `now_cost` (tenths) columns, and a long-format
// score file with one `(id, period, score)` row per forecast.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::asset::{Asset, AssetId, Availability, Price, TeamId};
use crate::horizon::PeriodId;
use crate::position::Position;
use crate::scores::ScoreTable;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Every asset known to the scoring provider together with its forecasts.
#[derive(Debug, Clone)]
pub struct Catalogue {
    pub assets: Vec<Asset>,
    pub scores: ScoreTable,
}

impl Catalogue {
    /// Look up an asset by id.
    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Map of asset id to asset, for repeated lookups.
    pub fn by_id(&self) -> HashMap<AssetId, &Asset> {
        self.assets.iter().map(|a| (a.id, a)).collect()
    }
}

/// File locations for the catalogue CSVs.
#[derive(Debug, Clone, Deserialize)]
pub struct CataloguePaths {
    pub assets: String,
    pub scores: String,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

/// Asset row. Extra columns in the export are ignored.
#[derive(Debug, Deserialize)]
struct RawAsset {
    #[serde(alias = "element")]
    id: u32,
    #[serde(alias = "name")]
    web_name: String,
    /// Numeric element type ("1".."4") or a position code ("MID").
    #[serde(alias = "position")]
    element_type: String,
    team: u32,
    /// Price in tenths.
    now_cost: u32,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    chance_of_playing_next_round: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawScore {
    #[serde(alias = "element")]
    id: u32,
    #[serde(alias = "gw", alias = "event")]
    period: u32,
    #[serde(alias = "xp")]
    score: f64,
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_assets_from_reader<R: Read>(rdr: R) -> Result<Vec<Asset>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut assets: Vec<Asset> = Vec::new();
    let mut seen: HashMap<u32, usize> = HashMap::new();

    for result in reader.deserialize::<RawAsset>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed asset row: {}", e);
                continue;
            }
        };
        let name = raw.web_name.trim().to_string();
        let Some(position) = Position::from_str_pos(&raw.element_type) else {
            warn!("skipping asset '{}': unknown position '{}'", name, raw.element_type);
            continue;
        };
        let chance = raw
            .chance_of_playing_next_round
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 100.0).round() as u8);
        let status = raw.status.as_deref().unwrap_or("a");
        let Some(availability) = Availability::from_status(status, chance) else {
            warn!("skipping asset '{}': unknown status '{}'", name, status);
            continue;
        };

        let asset = Asset {
            id: AssetId(raw.id),
            name,
            position,
            team: TeamId(raw.team),
            price: Price::from_tenths(raw.now_cost),
            availability,
        };
        if let Some(&idx) = seen.get(&raw.id) {
            warn!("duplicate asset id {}, using latest row", raw.id);
            assets[idx] = asset;
        } else {
            seen.insert(raw.id, assets.len());
            assets.push(asset);
        }
    }
    Ok(assets)
}

fn load_scores_from_reader<R: Read>(rdr: R) -> Result<ScoreTable, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut table = ScoreTable::new();
    for result in reader.deserialize::<RawScore>() {
        match result {
            Ok(raw) => {
                if !raw.score.is_finite() {
                    warn!(
                        "skipping score for asset {} period {}: non-finite value",
                        raw.id, raw.period
                    );
                    continue;
                }
                if table
                    .insert(AssetId(raw.id), PeriodId(raw.period), raw.score)
                    .is_some()
                {
                    warn!(
                        "duplicate score for asset {} period {}, using latest value",
                        raw.id, raw.period
                    );
                }
            }
            Err(e) => {
                warn!("skipping malformed score row: {}", e);
            }
        }
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load the asset catalogue from a CSV file.
pub fn load_assets(path: &Path) -> Result<Vec<Asset>, CatalogueError> {
    let file = std::fs::File::open(path).map_err(|e| CatalogueError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_assets_from_reader(file).map_err(|e| CatalogueError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load forecast scores from a long-format CSV file.
pub fn load_scores(path: &Path) -> Result<ScoreTable, CatalogueError> {
    let file = std::fs::File::open(path).map_err(|e| CatalogueError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_scores_from_reader(file).map_err(|e| CatalogueError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load and cross-check the asset and score files.
pub fn load_catalogue(paths: &CataloguePaths) -> Result<Catalogue, CatalogueError> {
    let assets = load_assets(Path::new(&paths.assets))?;
    let scores = load_scores(Path::new(&paths.scores))?;
    let catalogue = Catalogue { assets, scores };
    validate(&catalogue)?;
    Ok(catalogue)
}

/// Reject empty inputs and score entries for assets the catalogue does not
/// describe (no price, position or team to optimize with).
pub fn validate(catalogue: &Catalogue) -> Result<(), CatalogueError> {
    if catalogue.assets.is_empty() {
        return Err(CatalogueError::Validation(
            "asset CSV produced zero valid rows".into(),
        ));
    }
    if catalogue.scores.is_empty() {
        return Err(CatalogueError::Validation(
            "score CSV produced zero valid rows".into(),
        ));
    }
    let known = catalogue.by_id();
    if let Some(orphan) = catalogue.scores.assets().into_iter().find(|id| !known.contains_key(id)) {
        return Err(CatalogueError::Validation(format!(
            "score entry references asset {orphan} which is missing from the asset file"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
