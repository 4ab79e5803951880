//! Snapshot deltas between a start gameweek and the latest one.

use crate::data::{Metric, Position, Row, Table};
use crate::engine::{Cell, DerivedTable, EngineError};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub name: String,
    pub team: String,
    pub position: Position,
    pub start: f64,
    pub latest: f64,
    pub change: f64,
}

/// Price movement over the last `num_weeks` gameweeks, largest rise first.
pub fn largest_price_changes(table: &Table, num_weeks: u32) -> Result<Vec<Change>, EngineError> {
    largest_changes(table, num_weeks, Metric::Value)
}

/// Ownership movement over the last `num_weeks` gameweeks, largest rise first.
pub fn largest_ownership_changes(
    table: &Table,
    num_weeks: u32,
) -> Result<Vec<Change>, EngineError> {
    largest_changes(table, num_weeks, Metric::Selected)
}

fn largest_changes(
    table: &Table,
    num_weeks: u32,
    metric: Metric,
) -> Result<Vec<Change>, EngineError> {
    if num_weeks == 0 {
        return Err(EngineError::InvalidParameter(
            "number of weeks must be at least 1".to_string(),
        ));
    }
    let Some(latest_gw) = table.latest_gw() else {
        return Ok(Vec::new());
    };
    let start_gw = i64::from(latest_gw) - i64::from(num_weeks);
    if start_gw < 1 {
        debug!(latest_gw, num_weeks, "start gameweek precedes the season");
        return Ok(Vec::new());
    }

    let start = snapshot(table, start_gw as u32);
    let latest = snapshot(table, latest_gw);

    let mut changes: Vec<Change> = latest
        .into_iter()
        .filter_map(|(name, now)| {
            let before = start.get(name)?;
            let (from, to) = (before.metric(metric), now.metric(metric));
            Some(Change {
                name: name.to_string(),
                team: now.team.clone(),
                position: now.position,
                start: from,
                latest: to,
                change: to - from,
            })
        })
        .collect();

    changes.sort_by(|a, b| b.change.total_cmp(&a.change).then_with(|| a.name.cmp(&b.name)));
    debug!(%metric, start_gw, latest_gw, players = changes.len(), "computed changes");
    Ok(changes)
}

/// Rows at exactly `gw`, keyed by player; a repeated player keeps its last row.
fn snapshot(table: &Table, gw: u32) -> HashMap<&str, &Row> {
    table
        .rows()
        .iter()
        .filter(|r| r.gw == gw)
        .map(|r| (r.name.as_str(), r))
        .collect()
}

impl From<&[Change]> for DerivedTable {
    fn from(changes: &[Change]) -> Self {
        let columns = ["name", "team", "position", "start", "latest", "change"];
        let mut table = DerivedTable::new(columns.into_iter().map(String::from).collect());
        for c in changes {
            table.push_row(vec![
                Cell::Text(c.name.clone()),
                Cell::Text(c.team.clone()),
                Cell::Text(c.position.to_string()),
                Cell::Number(c.start),
                Cell::Number(c.latest),
                Cell::Number(c.change),
            ]);
        }
        table
    }
}
