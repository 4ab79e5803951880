//! Table Query Module
//! Free-form filter / group / sort used by the tables view.

use crate::data::{Field, Metric, Position, Row, Table};
use crate::engine::{Cell, DerivedTable, EngineError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order '{other}', expected asc or desc")),
        }
    }
}

/// Parameters for one evaluation of the tables view.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub columns: Vec<Field>,
    /// Inclusive price range.
    pub value_range: (f64, f64),
    /// Inclusive gameweek range.
    pub gw_range: (u32, u32),
    /// Allowed positions; empty means all.
    pub positions: Vec<Position>,
    pub sort_by: Option<Field>,
    pub sort_order: SortOrder,
    /// Metrics that take the latest gameweek's value instead of a sum. When unset,
    /// `Field::is_snapshot` decides. Name, team, position and GW are always snapshots.
    pub snapshot_columns: Option<Vec<Field>>,
}

impl Query {
    /// Query over the full value and gameweek ranges with no position filter.
    pub fn new(columns: Vec<Field>) -> Self {
        Self {
            columns,
            value_range: (f64::NEG_INFINITY, f64::INFINITY),
            gw_range: (1, u32::MAX),
            positions: Vec::new(),
            sort_by: None,
            sort_order: SortOrder::default(),
            snapshot_columns: None,
        }
    }

    pub fn sorted_by(mut self, field: Field, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = order;
        self
    }

    pub fn with_value_range(mut self, min: f64, max: f64) -> Self {
        self.value_range = (min, max);
        self
    }

    pub fn with_gw_range(mut self, first: u32, last: u32) -> Self {
        self.gw_range = (first, last);
        self
    }

    pub fn with_positions(mut self, positions: Vec<Position>) -> Self {
        self.positions = positions;
        self
    }

    pub fn with_snapshot_columns(mut self, columns: Vec<Field>) -> Self {
        self.snapshot_columns = Some(columns);
        self
    }

    fn is_snapshot(&self, field: Field) -> bool {
        match (field, &self.snapshot_columns) {
            (Field::Metric(_), Some(snapshots)) => snapshots.contains(&field),
            _ => field.is_snapshot(),
        }
    }

    fn accepts(&self, row: &Row) -> bool {
        let value = row.value();
        value >= self.value_range.0
            && value <= self.value_range.1
            && row.gw >= self.gw_range.0
            && row.gw <= self.gw_range.1
            && (self.positions.is_empty() || self.positions.contains(&row.position))
    }

    fn validate(&self) -> Result<Field, EngineError> {
        if self.columns.is_empty() {
            return Err(EngineError::MissingParameter("selected columns"));
        }
        let sort_by = self
            .sort_by
            .ok_or(EngineError::MissingParameter("sort column"))?;
        if !self.columns.contains(&sort_by) {
            return Err(EngineError::InvalidParameter(format!(
                "sort column '{sort_by}' is not among the selected columns"
            )));
        }
        for (i, field) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(field) {
                return Err(EngineError::InvalidParameter(format!(
                    "column '{field}' selected more than once"
                )));
            }
        }
        if self.value_range.0.is_nan() || self.value_range.1.is_nan() {
            return Err(EngineError::InvalidParameter(
                "value range bounds must be numbers".to_string(),
            ));
        }
        if self.value_range.0 > self.value_range.1 {
            return Err(EngineError::InvalidParameter(
                "value range minimum exceeds maximum".to_string(),
            ));
        }
        if self.gw_range.0 > self.gw_range.1 {
            return Err(EngineError::InvalidParameter(
                "gameweek range start exceeds end".to_string(),
            ));
        }
        Ok(sort_by)
    }
}

/// Parse column names as they appear in the CSV header.
pub fn parse_fields(names: &[String]) -> Result<Vec<Field>, EngineError> {
    names
        .iter()
        .map(|n| n.parse::<Field>().map_err(EngineError::InvalidParameter))
        .collect()
}

struct Group<'a> {
    latest: &'a Row,
    sums: [f64; Metric::COUNT],
}

/// Filter, group by player and sort.
///
/// Snapshot fields come from the player's latest gameweek inside the filtered rows
/// (ties resolve to the later row in table order); every other metric is summed.
/// `Query::snapshot_columns` overrides which metrics count as snapshots.
/// Groups start in name order and the sort is stable.
pub fn query_table(table: &Table, query: &Query) -> Result<DerivedTable, EngineError> {
    let sort_by = query.validate()?;

    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();
    for row in table.rows().iter().filter(|r| query.accepts(r)) {
        let group = groups.entry(row.name.as_str()).or_insert(Group {
            latest: row,
            sums: [0.0; Metric::COUNT],
        });
        if row.gw >= group.latest.gw {
            group.latest = row;
        }
        for metric in Metric::ALL {
            group.sums[metric.index()] += row.metric(metric);
        }
    }
    debug!(players = groups.len(), "grouped table query");

    let mut rows: Vec<Vec<Cell>> = groups
        .values()
        .map(|g| query.columns.iter().map(|f| cell(query, g, *f)).collect())
        .collect();

    let sort_idx = query
        .columns
        .iter()
        .position(|f| *f == sort_by)
        .unwrap_or_default();
    match query.sort_order {
        SortOrder::Ascending => rows.sort_by(|a, b| a[sort_idx].total_cmp(&b[sort_idx])),
        SortOrder::Descending => rows.sort_by(|a, b| b[sort_idx].total_cmp(&a[sort_idx])),
    }

    let mut result = DerivedTable::new(query.columns.iter().map(|f| f.to_string()).collect());
    for row in rows {
        result.push_row(row);
    }
    Ok(result)
}

fn cell(query: &Query, group: &Group, field: Field) -> Cell {
    match field {
        Field::Metric(m) if !query.is_snapshot(field) => Cell::Number(group.sums[m.index()]),
        _ => snapshot_cell(group.latest, field),
    }
}

fn snapshot_cell(latest: &Row, field: Field) -> Cell {
    match field {
        Field::Name => Cell::Text(latest.name.clone()),
        Field::Team => Cell::Text(latest.team.clone()),
        Field::Position => Cell::Text(latest.position.to_string()),
        Field::Gameweek => Cell::Integer(i64::from(latest.gw)),
        Field::Metric(m) => Cell::Number(latest.metric(m)),
    }
}
