// Configuration loading and parsing (rules.toml, strategy.toml).

use serde::Deserialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use gaffer_core::{CataloguePaths, GameRules, PeriodId};
use gaffer_solver::{BudgetPolicy, PlannerSettings, SelectorSettings, SolveOptions, TieBreak};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub rules: GameRules,
    pub strategy: StrategyConfig,
    pub data_paths: CataloguePaths,
}

// ---------------------------------------------------------------------------
// rules.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[rules]` table in rules.toml.
#[derive(Debug, Clone, Deserialize)]
struct RulesFile {
    rules: GameRules,
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    horizon: HorizonSection,
    #[serde(default)]
    planner: PlannerSettings,
    #[serde(default)]
    selector: SelectorSection,
    #[serde(default)]
    solver: SolverSection,
    #[serde(default)]
    candidates: CandidatesSection,
    data_paths: CataloguePaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HorizonSection {
    /// Period solved when no `--period` is given.
    pub start: PeriodId,
    /// Number of periods solved jointly by the planner.
    pub lookahead: u32,
    /// Final period of the season; horizons are clipped here.
    pub last_period: PeriodId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SelectorSection {
    exclude_doubtful: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SolverSection {
    tie_break: TieBreak,
    time_limit_secs: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct CandidatesSection {
    per_position: usize,
}

impl Default for CandidatesSection {
    fn default() -> Self {
        CandidatesSection { per_position: 12 }
    }
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub horizon: HorizonSection,
    pub planner: PlannerSettings,
    pub selector: SelectorSettings,
    pub tie_break: TieBreak,
    pub time_limit: Option<Duration>,
    /// Non-owned alternatives per position offered to the planner.
    pub candidates_per_position: usize,
}

impl StrategyConfig {
    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            time_limit: self.time_limit,
            tie_break: self.tie_break,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/rules.toml` and
/// `config/strategy.toml`, both relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- rules.toml (required) ---
    let rules_path = config_dir.join("rules.toml");
    let rules_text = read_file(&rules_path)?;
    let rules_file: RulesFile =
        toml::from_str(&rules_text).map_err(|e| ConfigError::ParseError {
            path: rules_path.clone(),
            source: e,
        })?;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let time_limit = match strategy_file.solver.time_limit_secs {
        Some(secs) if !secs.is_finite() || secs <= 0.0 => {
            return Err(ConfigError::ValidationError {
                field: "solver.time_limit_secs".into(),
                message: format!("must be a positive number of seconds, got {secs}"),
            });
        }
        Some(secs) => Some(Duration::from_secs_f64(secs)),
        None => None,
    };

    let strategy = StrategyConfig {
        horizon: strategy_file.horizon,
        planner: strategy_file.planner,
        selector: SelectorSettings {
            exclude_doubtful: strategy_file.selector.exclude_doubtful,
        },
        tie_break: strategy_file.solver.tie_break,
        time_limit,
        candidates_per_position: strategy_file.candidates.per_position,
    };

    let config = Config {
        rules: rules_file.rules,
        strategy,
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Files gaffer reads from `config/`, seeded from `defaults/` on first run.
pub const CONFIG_FILES: [&str; 2] = ["rules.toml", "strategy.toml"];

/// Seed `config/` with whichever of [`CONFIG_FILES`] it lacks.
///
/// Files already in `config/` are never overwritten, so local edits survive
/// upgrades. Returns the paths written. Running outside a project (neither
/// directory present) is an error; a project with only `config/` is left as is.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        return if config_dir.is_dir() {
            Ok(Vec::new())
        } else {
            Err(seed_error(format!(
                "no defaults/ or config/ directory under {}; run gaffer from the project root",
                base_dir.display()
            )))
        };
    }
    fs::create_dir_all(&config_dir)
        .map_err(|e| seed_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let mut written = Vec::new();
    for name in CONFIG_FILES {
        let source = defaults_dir.join(name);
        if !source.is_file() {
            warn!("{} is missing, not seeding config/{}", source.display(), name);
            continue;
        }
        let target = config_dir.join(name);
        if seed_file(&source, &target)? {
            info!("Seeded {} from defaults", target.display());
            written.push(target);
        }
    }
    Ok(written)
}

/// Copy `source` to `target` unless `target` already exists. Returns whether
/// anything was written.
fn seed_file(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match File::create_new(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(seed_error(format!("cannot create {}: {e}", target.display()))),
    };
    let mut src = File::open(source)
        .map_err(|e| seed_error(format!("cannot read {}: {e}", source.display())))?;
    io::copy(&mut src, &mut dest)
        .map_err(|e| seed_error(format!("cannot write {}: {e}", target.display())))?;
    Ok(true)
}

fn seed_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    config
        .rules
        .validate()
        .map_err(|e| ConfigError::ValidationError {
            field: format!("rules.{}", e.field),
            message: e.message,
        })?;

    let horizon = &config.strategy.horizon;
    if horizon.lookahead == 0 {
        return Err(ConfigError::ValidationError {
            field: "horizon.lookahead".into(),
            message: "must be greater than 0".into(),
        });
    }
    if horizon.start > horizon.last_period {
        return Err(ConfigError::ValidationError {
            field: "horizon.start".into(),
            message: format!(
                "period {} is after the last period {}",
                horizon.start, horizon.last_period
            ),
        });
    }

    let planner = &config.strategy.planner;
    if planner.initial_free_transfers > config.rules.max_free_transfers {
        return Err(ConfigError::ValidationError {
            field: "planner.initial_free_transfers".into(),
            message: format!(
                "{} exceeds rules.max_free_transfers {}",
                planner.initial_free_transfers, config.rules.max_free_transfers
            ),
        });
    }
    if let BudgetPolicy::FlatCap { cap } = planner.budget {
        if cap.tenths() == 0 {
            return Err(ConfigError::ValidationError {
                field: "planner.budget.cap".into(),
                message: "must be greater than 0".into(),
            });
        }
    }

    if config.strategy.candidates_per_position == 0 {
        return Err(ConfigError::ValidationError {
            field: "candidates.per_position".into(),
            message: "must be greater than 0".into(),
        });
    }

    for (name, path) in [
        ("data_paths.assets", &config.data_paths.assets),
        ("data_paths.scores", &config.data_paths.scores),
    ] {
        if path.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.into(),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
