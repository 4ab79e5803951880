//! Series Module
//! Builds per-statistic, per-player gameweek series with an optional trailing mean.

use crate::data::{Metric, Row, Table};
use crate::engine::EngineError;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub gw: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSeries {
    pub player: String,
    pub points: Vec<SeriesPoint>,
}

/// One chart: a statistic plotted for every selected player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatChart {
    pub stat: String,
    pub title: String,
    pub series: Vec<PlayerSeries>,
}

/// Trailing mean over up to `window` points ending at each position.
///
/// The first `window - 1` points average over however many samples exist, so the
/// output always has the same length as the input.
pub fn trailing_average(values: &[f64], window: usize) -> Result<Vec<f64>, EngineError> {
    if window == 0 {
        return Err(EngineError::InvalidParameter(
            "trailing window must be at least 1".to_string(),
        ));
    }
    Ok(rolling_mean(values, window))
}

/// `window` must be non-zero.
fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            values[start..=i].iter().mean()
        })
        .collect()
}

/// Build one chart per statistic.
///
/// `trailing` only takes effect when it is a positive window; otherwise raw values
/// are plotted. An empty player or statistic selection yields no charts.
pub fn player_series(
    table: &Table,
    players: &[String],
    stats: &[Metric],
    trailing: Option<usize>,
) -> Vec<StatChart> {
    if players.is_empty() || stats.is_empty() {
        return Vec::new();
    }
    let window = trailing.filter(|k| *k > 0);

    // Rows per player in gameweek order; shared by every chart.
    let per_player: Vec<(&String, Vec<&Row>)> = players
        .iter()
        .map(|player| {
            let mut rows: Vec<&Row> = table.rows().iter().filter(|r| &r.name == player).collect();
            rows.sort_by_key(|r| r.gw);
            (player, rows)
        })
        .collect();

    stats
        .par_iter()
        .map(|stat| {
            let series = per_player
                .iter()
                .map(|(player, rows)| {
                    let raw: Vec<f64> = rows.iter().map(|r| r.metric(*stat)).collect();
                    let values = match window {
                        Some(k) => rolling_mean(&raw, k),
                        None => raw,
                    };
                    PlayerSeries {
                        player: (*player).clone(),
                        points: rows
                            .iter()
                            .zip(values)
                            .map(|(r, value)| SeriesPoint { gw: r.gw, value })
                            .collect(),
                    }
                })
                .collect();

            let title = match window {
                Some(k) => format!("Trailing Avg ({k} GW) of {stat}"),
                None => stat.to_string(),
            };
            StatChart {
                stat: stat.to_string(),
                title,
                series,
            }
        })
        .collect()
}
