//! Data Model Module
//! Typed rows for one season of weekly player performance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Playing position. Declaration order is the display order (GK, DEF, MID, FWD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Gk,
    #[serde(rename = "DEF")]
    Def,
    #[serde(rename = "MID")]
    Mid,
    #[serde(rename = "FWD")]
    Fwd,
}

impl Position {
    pub const ALL: [Position; 4] = [Position::Gk, Position::Def, Position::Mid, Position::Fwd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Gk => "GK",
            Position::Def => "DEF",
            Position::Mid => "MID",
            Position::Fwd => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GK" | "GKP" => Ok(Position::Gk),
            "DEF" => Ok(Position::Def),
            "MID" => Ok(Position::Mid),
            "FWD" => Ok(Position::Fwd),
            other => Err(format!("unknown position '{other}'")),
        }
    }
}

/// Numeric per-gameweek columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Value,
    Selected,
    TotalPoints,
    Minutes,
    GoalsScored,
    Assists,
    Bonus,
    Bps,
    CleanSheets,
    Creativity,
    GoalsConceded,
    IctIndex,
    Influence,
    Saves,
    Threat,
    TransfersBalance,
    YellowCards,
    RedCards,
    ExpectedPoints,
}

impl Metric {
    pub const COUNT: usize = 19;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::Value,
        Metric::Selected,
        Metric::TotalPoints,
        Metric::Minutes,
        Metric::GoalsScored,
        Metric::Assists,
        Metric::Bonus,
        Metric::Bps,
        Metric::CleanSheets,
        Metric::Creativity,
        Metric::GoalsConceded,
        Metric::IctIndex,
        Metric::Influence,
        Metric::Saves,
        Metric::Threat,
        Metric::TransfersBalance,
        Metric::YellowCards,
        Metric::RedCards,
        Metric::ExpectedPoints,
    ];

    /// Column name as it appears in the CSV header.
    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::Value => "value",
            Metric::Selected => "selected",
            Metric::TotalPoints => "total_points",
            Metric::Minutes => "minutes",
            Metric::GoalsScored => "goals_scored",
            Metric::Assists => "assists",
            Metric::Bonus => "bonus",
            Metric::Bps => "bps",
            Metric::CleanSheets => "clean_sheets",
            Metric::Creativity => "creativity",
            Metric::GoalsConceded => "goals_conceded",
            Metric::IctIndex => "ict_index",
            Metric::Influence => "influence",
            Metric::Saves => "saves",
            Metric::Threat => "threat",
            Metric::TransfersBalance => "transfers_balance",
            Metric::YellowCards => "yellow_cards",
            Metric::RedCards => "red_cards",
            Metric::ExpectedPoints => "xP",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.column_name() == s)
            .ok_or_else(|| format!("unknown statistic '{s}'"))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Any column a table query can select or sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Team,
    Position,
    Gameweek,
    Metric(Metric),
}

impl Field {
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Team => "team",
            Field::Position => "position",
            Field::Gameweek => "GW",
            Field::Metric(m) => m.column_name(),
        }
    }

    /// Snapshot fields take the most recent gameweek's value; everything else is summed.
    pub fn is_snapshot(&self) -> bool {
        matches!(
            self,
            Field::Name
                | Field::Team
                | Field::Position
                | Field::Gameweek
                | Field::Metric(Metric::Value)
        )
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Field::Name),
            "team" => Ok(Field::Team),
            "position" => Ok(Field::Position),
            "GW" => Ok(Field::Gameweek),
            other => other
                .parse::<Metric>()
                .map(Field::Metric)
                .map_err(|_| format!("unknown column '{other}'")),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One player's stats for one gameweek.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub team: String,
    pub position: Position,
    pub gw: u32,
    metrics: [f64; Metric::COUNT],
}

impl Row {
    pub fn new(name: &str, team: &str, position: Position, gw: u32) -> Self {
        Self {
            name: name.to_string(),
            team: team.to_string(),
            position,
            gw,
            metrics: [0.0; Metric::COUNT],
        }
    }

    /// Builder-style setter, mostly for assembling rows by hand.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, value);
        self
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.metrics[metric.index()] = value;
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        self.metrics[metric.index()]
    }

    pub fn value(&self) -> f64 {
        self.metric(Metric::Value)
    }
}

/// Immutable season table, loaded once and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Highest gameweek present, if any rows are loaded.
    pub fn latest_gw(&self) -> Option<u32> {
        self.rows.iter().map(|r| r.gw).max()
    }

    /// Sorted unique player names.
    pub fn players(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Inclusive bounds of player price across the season.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.rows.iter().map(Row::value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Inclusive bounds of the gameweeks present.
    pub fn gw_bounds(&self) -> Option<(u32, u32)> {
        let min = self.rows.iter().map(|r| r.gw).min()?;
        let max = self.rows.iter().map(|r| r.gw).max()?;
        Some((min, max))
    }
}
