//! Overview Module
//! Per-position rankings plus price and ownership movers for one window.

use crate::data::{Position, Table};
use crate::engine::{
    best_performers_by_points, best_performers_by_value, largest_ownership_changes,
    largest_price_changes, Change, EngineError, Performer,
};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionTable {
    pub position: Position,
    pub performers: Vec<Performer>,
    /// Set when this ranking could not be computed; `performers` is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,
}

impl PositionTable {
    fn ranked(position: Position, performers: Vec<Performer>) -> Self {
        Self {
            position,
            performers,
            error: None,
        }
    }

    fn failed(position: Position, error: EngineError) -> Self {
        Self {
            position,
            performers: Vec::new(),
            error: Some(error),
        }
    }
}

/// Everything the overview shows for a window of `weeks` gameweeks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub weeks: u32,
    pub latest_gw: Option<u32>,
    pub by_points: Vec<PositionTable>,
    pub by_value: Vec<PositionTable>,
    pub price_changes: Vec<Change>,
    pub ownership_changes: Vec<Change>,
}

impl Overview {
    /// A zero price only fails the value table of that player's position; the other
    /// tables are still computed.
    pub fn compute(table: &Table, weeks: u32) -> Result<Self, EngineError> {
        let mut by_points = Vec::with_capacity(Position::ALL.len());
        let mut by_value = Vec::with_capacity(Position::ALL.len());
        for position in Position::ALL {
            let points = best_performers_by_points(table, weeks, &[position])?;
            by_points.push(PositionTable::ranked(position, points));
            let value = match best_performers_by_value(table, weeks, &[position]) {
                Ok(performers) => PositionTable::ranked(position, performers),
                Err(err @ EngineError::DivisionUndefined { .. }) => {
                    warn!(%position, "{err}");
                    PositionTable::failed(position, err)
                }
                Err(err) => return Err(err),
            };
            by_value.push(value);
        }

        Ok(Self {
            weeks,
            latest_gw: table.latest_gw(),
            by_points,
            by_value,
            price_changes: largest_price_changes(table, weeks)?,
            ownership_changes: largest_ownership_changes(table, weeks)?,
        })
    }
}
