// Library root: the squad optimization engine.
//
// Every entry point takes its rules and settings explicitly and returns a
// fresh result or a structured error; nothing is cached between calls.

pub mod lineup;
pub mod model;
pub mod plan;
pub mod planner;
pub mod selector;
pub mod suggest;
pub mod universe;
pub mod validate;

#[cfg(test)]
mod fixtures;

pub use lineup::select_lineup;
pub use model::{SolveError, SolveOptions, SolveStatus, TieBreak};
pub use plan::{LineupSelection, PeriodPlan, SquadSelection, Suggestion, TransferPlan};
pub use planner::{plan_transfers, BudgetPolicy, FirstPeriod, PlanInput, PlannerSettings};
pub use selector::{select_squad, SelectorSettings};
pub use suggest::suggest_transfers;
pub use universe::candidate_universe;
pub use validate::InputError;
