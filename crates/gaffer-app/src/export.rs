// JSON export of a solved transfer plan.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use gaffer_core::PeriodId;
use gaffer_solver::TransferPlan;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize plan: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// File layout of an exported plan.
#[derive(Debug, Serialize)]
pub struct PlanExport<'a> {
    pub generated_at: DateTime<Utc>,
    pub horizon: Vec<PeriodId>,
    pub plan: &'a TransferPlan,
}

impl<'a> PlanExport<'a> {
    pub fn new(plan: &'a TransferPlan, generated_at: DateTime<Utc>) -> Self {
        PlanExport {
            generated_at,
            horizon: plan.periods.iter().map(|p| p.period).collect(),
            plan,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write `plan` to `path` as pretty JSON stamped with the current time.
pub fn write_plan_json(path: &Path, plan: &TransferPlan) -> Result<(), ExportError> {
    let json = PlanExport::new(plan, Utc::now()).to_json()?;
    std::fs::write(path, json).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })
}
