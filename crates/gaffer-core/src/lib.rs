// Library root: domain types shared by the solver and the application.

pub mod asset;
pub mod catalogue;
pub mod horizon;
pub mod position;
pub mod rules;
pub mod scores;

pub use asset::{Asset, AssetId, Availability, Price, TeamId};
pub use catalogue::{Catalogue, CatalogueError, CataloguePaths};
pub use horizon::{Horizon, HorizonError, PeriodId};
pub use position::{Position, PositionMap};
pub use rules::{Bounds, GameRules, RulesError};
pub use scores::ScoreTable;
