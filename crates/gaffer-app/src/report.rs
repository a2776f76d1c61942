// Strategy reporter: renders solve results as plain text.
//
// Every renderer returns a String; printing is left to the caller. A failed
// solve renders its status line and nothing else.

use std::collections::HashMap;

use gaffer_core::{Asset, AssetId, Position};
use gaffer_solver::{
    LineupSelection, PeriodPlan, SolveError, SquadSelection, Suggestion, TransferPlan,
};

// ---------------------------------------------------------------------------
// Asset labels
// ---------------------------------------------------------------------------

/// Id lookup used to print names, positions and prices next to asset ids.
pub struct Names<'a> {
    by_id: HashMap<AssetId, &'a Asset>,
}

impl<'a> Names<'a> {
    pub fn new(assets: &'a [Asset]) -> Self {
        Names {
            by_id: assets.iter().map(|a| (a.id, a)).collect(),
        }
    }

    /// `Name (POS, 5.5)`, or the bare id when the asset is unknown.
    pub fn label(&self, id: AssetId) -> String {
        match self.by_id.get(&id) {
            Some(a) => format!("{} ({}, {})", a.name, a.position, a.price),
            None => format!("#{id}"),
        }
    }

    fn name(&self, id: AssetId) -> String {
        match self.by_id.get(&id) {
            Some(a) => a.name.clone(),
            None => format!("#{id}"),
        }
    }

    fn position(&self, id: AssetId) -> Option<Position> {
        self.by_id.get(&id).map(|a| a.position)
    }

    fn labels(&self, ids: &[AssetId]) -> String {
        ids.iter()
            .map(|&id| self.label(id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Status line for a solve that produced no result.
pub fn render_error(err: &SolveError) -> String {
    format!("{err}\n")
}

/// Render `result` with `render`, or its error status alone.
pub fn render_outcome<T>(
    result: &Result<T, SolveError>,
    render: impl FnOnce(&T) -> String,
) -> String {
    match result {
        Ok(value) => render(value),
        Err(err) => render_error(err),
    }
}

pub fn render_selection(sel: &SquadSelection, lineup: &LineupSelection, names: &Names) -> String {
    let mut lines = vec![
        format!(
            "Squad for GW {}: {} (score {:.2}, cost {})",
            sel.period, sel.status, sel.total_score, sel.total_price
        ),
        String::new(),
    ];
    lines.extend(squad_lines(&sel.ids(), names));
    lines.push(String::new());
    lines.extend(lineup_lines(lineup, names));
    finish(lines)
}

pub fn render_lineup(lineup: &LineupSelection, names: &Names) -> String {
    let mut lines = vec![
        format!("Lineup for GW {}: {}", lineup.period, lineup.status),
        String::new(),
    ];
    lines.extend(lineup_lines(lineup, names));
    finish(lines)
}

pub fn render_plan(plan: &TransferPlan, names: &Names) -> String {
    let mut lines = vec![
        format!(
            "Transfer plan over {} periods: {} (objective {:.2})",
            plan.periods.len(),
            plan.status,
            plan.objective
        ),
        format!(
            "Transfers: {}, hits: {} (-{:.1} pts)",
            plan.total_transfers(),
            plan.total_hits,
            f64::from(plan.total_hits) * plan.hit_cost
        ),
    ];
    if let Some(period) = plan.bench_boost_period {
        lines.push(format!("Bench boost: GW {period}"));
    }
    for period in &plan.periods {
        lines.push(String::new());
        lines.extend(period_lines(period, plan.hit_cost, names));
    }
    finish(lines)
}

pub fn render_suggestions(suggestions: &[Suggestion], names: &Names) -> String {
    if suggestions.is_empty() {
        return "No improving swaps found.\n".to_string();
    }
    let mut lines = vec!["Suggested swaps:".to_string()];
    for s in suggestions {
        lines.push(format!(
            "  {} -> {}  (+{:.2})",
            names.label(s.out),
            names.label(s.incoming),
            s.gain
        ));
    }
    finish(lines)
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn squad_lines(squad: &[AssetId], names: &Names) -> Vec<String> {
    let mut lines = vec!["Squad:".to_string()];
    for position in Position::ALL {
        let members: Vec<String> = squad
            .iter()
            .filter(|&&id| names.position(id) == Some(position))
            .map(|&id| names.name(id))
            .collect();
        lines.push(format!("  {position}: {}", members.join(", ")));
    }
    let unknown: Vec<String> = squad
        .iter()
        .filter(|&&id| names.position(id).is_none())
        .map(|&id| names.name(id))
        .collect();
    if !unknown.is_empty() {
        lines.push(format!("  ???: {}", unknown.join(", ")));
    }
    lines
}

fn lineup_lines(lineup: &LineupSelection, names: &Names) -> Vec<String> {
    vec![
        format!("Starters: {}", names.labels(&lineup.starters)),
        format!("Bench: {}", names.labels(&lineup.bench)),
        format!("Captain: {}", names.label(lineup.captain)),
        format!("Vice-captain: {}", names.label(lineup.vice_captain)),
        format!("Expected points: {:.2}", lineup.objective),
    ]
}

fn period_lines(period: &PeriodPlan, hit_cost: f64, names: &Names) -> Vec<String> {
    let mut header = format!("== GW {} ==", period.period);
    if period.bench_boost {
        header.push_str(" [BENCH BOOST]");
    }
    let mut lines = vec![header];

    if !period.transfer_period {
        lines.push("Transfers: none (squad plays as-is)".to_string());
    } else if period.is_hold() {
        lines.push("Transfers: HOLD".to_string());
    } else {
        lines.push(format!("In:  {}", names.labels(&period.transfers_in)));
        lines.push(format!("Out: {}", names.labels(&period.transfers_out)));
    }
    if period.transfer_period {
        lines.push(format!(
            "Free transfers used: {}, hits: {} (-{:.1} pts)",
            period.free_used,
            period.hits,
            f64::from(period.hits) * hit_cost
        ));
    }
    lines.push(format!("Free transfers next: {}", period.free_transfers_next));
    if let Some(bank) = period.bank {
        lines.push(format!("Bank: {bank}"));
    }

    lines.extend(squad_lines(&period.squad, names));
    lines.push(format!("Starters: {}", names.labels(&period.starters)));
    lines.push(format!("Bench: {}", names.labels(&period.bench)));
    lines.push(format!("Captain: {}", names.label(period.captain)));
    lines.push(format!("Vice-captain: {}", names.label(period.vice_captain)));
    lines.push(format!("Period score: {:.2}", period.score));
    lines
}

fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
