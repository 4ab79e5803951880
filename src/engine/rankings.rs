//! Rankings Module
//! Windowed best-performer tables for the overview.

use crate::data::{Metric, Position, Row, Table};
use crate::engine::{Cell, DerivedTable, EngineError};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Maximum rows returned by a ranking.
pub const TOP_N: usize = 50;

/// One player's aggregate over the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performer {
    pub name: String,
    pub team: String,
    pub position: Position,
    pub total_points: f64,
    /// Price at the player's latest gameweek in the window.
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_per_value: Option<f64>,
}

/// Rows from the last `num_weeks` gameweeks: `GW > latest - num_weeks`.
pub fn windowed_filter(table: &Table, num_weeks: u32) -> Result<Vec<&Row>, EngineError> {
    if num_weeks == 0 {
        return Err(EngineError::InvalidParameter(
            "number of weeks must be at least 1".to_string(),
        ));
    }
    let Some(latest) = table.latest_gw() else {
        return Ok(Vec::new());
    };
    let threshold = i64::from(latest) - i64::from(num_weeks);
    Ok(table
        .rows()
        .iter()
        .filter(|r| i64::from(r.gw) > threshold)
        .collect())
}

/// Top players by summed points over the window.
pub fn best_performers_by_points(
    table: &Table,
    num_weeks: u32,
    positions: &[Position],
) -> Result<Vec<Performer>, EngineError> {
    let mut performers = aggregate(table, num_weeks, positions)?;
    performers.sort_by(|a, b| {
        b.total_points
            .total_cmp(&a.total_points)
            .then_with(|| tie_break(a, b))
    });
    performers.truncate(TOP_N);
    Ok(performers)
}

/// Top players by points per unit of price, rounded to one decimal.
pub fn best_performers_by_value(
    table: &Table,
    num_weeks: u32,
    positions: &[Position],
) -> Result<Vec<Performer>, EngineError> {
    let mut performers = aggregate(table, num_weeks, positions)?;
    for p in &mut performers {
        if p.value == 0.0 {
            return Err(EngineError::DivisionUndefined {
                name: p.name.clone(),
            });
        }
        p.points_per_value = Some(round1(p.total_points / p.value));
    }
    performers.sort_by(|a, b| {
        let (pa, pb) = (a.points_per_value.unwrap_or(0.0), b.points_per_value.unwrap_or(0.0));
        pb.total_cmp(&pa).then_with(|| tie_break(a, b))
    });
    performers.truncate(TOP_N);
    Ok(performers)
}

fn tie_break(a: &Performer, b: &Performer) -> Ordering {
    a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name))
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

struct Accumulator<'a> {
    latest: &'a Row,
    total_points: f64,
}

/// Group windowed rows by (name, position), keeping the price from the latest
/// gameweek. Ties on gameweek resolve to the later row in table order.
fn aggregate(
    table: &Table,
    num_weeks: u32,
    positions: &[Position],
) -> Result<Vec<Performer>, EngineError> {
    let window = windowed_filter(table, num_weeks)?;
    debug!(num_weeks, rows = window.len(), "aggregating window");

    let mut groups: BTreeMap<(&str, Position), Accumulator> = BTreeMap::new();
    for row in window {
        let points = row.metric(Metric::TotalPoints);
        groups
            .entry((row.name.as_str(), row.position))
            .and_modify(|acc| {
                acc.total_points += points;
                if row.gw >= acc.latest.gw {
                    acc.latest = row;
                }
            })
            .or_insert(Accumulator {
                latest: row,
                total_points: points,
            });
    }

    Ok(groups
        .into_iter()
        .filter(|((_, position), _)| positions.contains(position))
        .map(|((name, position), acc)| Performer {
            name: name.to_string(),
            team: acc.latest.team.clone(),
            position,
            total_points: acc.total_points,
            value: acc.latest.value(),
            points_per_value: None,
        })
        .collect())
}

impl From<&[Performer]> for DerivedTable {
    fn from(performers: &[Performer]) -> Self {
        let with_ratio = performers.iter().any(|p| p.points_per_value.is_some());
        let mut columns = vec!["name", "team", "position", "total_points", "value"];
        if with_ratio {
            columns.push("points_per_value");
        }
        let mut table = DerivedTable::new(columns.into_iter().map(String::from).collect());
        for p in performers {
            let mut row = vec![
                Cell::Text(p.name.clone()),
                Cell::Text(p.team.clone()),
                Cell::Text(p.position.to_string()),
                Cell::Number(p.total_points),
                Cell::Number(p.value),
            ];
            if with_ratio {
                row.push(Cell::Number(p.points_per_value.unwrap_or(0.0)));
            }
            table.push_row(row);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, position: Position, gw: u32, points: f64, value: f64) -> Row {
        Row::new(name, "TST", position, gw)
            .with(Metric::TotalPoints, points)
            .with(Metric::Value, value)
    }

    fn two_week_table() -> Table {
        Table::new(vec![
            row("Haaland", Position::Fwd, 1, 20.0, 140.0),
            row("Saka", Position::Mid, 1, 2.0, 90.0),
            row("Raya", Position::Gk, 1, 6.0, 50.0),
            row("Haaland", Position::Fwd, 2, 2.0, 141.0),
            row("Saka", Position::Mid, 2, 12.0, 91.0),
            row("Raya", Position::Gk, 2, 8.0, 50.0),
        ])
    }

    #[test]
    fn zero_weeks_is_rejected() {
        assert!(matches!(
            windowed_filter(&two_week_table(), 0),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn window_keeps_only_recent_gameweeks() {
        let table = two_week_table();
        let rows = windowed_filter(&table, 1).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.gw == 2));
        assert_eq!(windowed_filter(&table, 10).unwrap().len(), 6);
    }

    #[test]
    fn points_ranking_sums_only_the_window() {
        let table = two_week_table();
        let best = best_performers_by_points(&table, 1, &Position::ALL).unwrap();
        let summary: Vec<(&str, f64)> = best
            .iter()
            .map(|p| (p.name.as_str(), p.total_points))
            .collect();
        assert_eq!(summary, vec![("Saka", 12.0), ("Raya", 8.0), ("Haaland", 2.0)]);

        let full = best_performers_by_points(&table, 2, &Position::ALL).unwrap();
        assert_eq!(full[0].name, "Haaland");
        assert_eq!(full[0].total_points, 22.0);
        assert_eq!(full[0].value, 141.0);
    }

    #[test]
    fn ties_break_on_position_then_name() {
        let table = Table::new(vec![
            row("Zed", Position::Mid, 1, 5.0, 50.0),
            row("Amy", Position::Mid, 1, 5.0, 50.0),
            row("Kev", Position::Gk, 1, 5.0, 50.0),
        ]);
        let best = best_performers_by_points(&table, 1, &Position::ALL).unwrap();
        let names: Vec<&str> = best.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Kev", "Amy", "Zed"]);
    }

    #[test]
    fn position_filter_and_top_limit() {
        let rows: Vec<Row> = (0..80)
            .map(|i| row(&format!("Def{i:02}"), Position::Def, 1, i as f64, 45.0))
            .chain(std::iter::once(row("Fwd", Position::Fwd, 1, 100.0, 75.0)))
            .collect();
        let best = best_performers_by_points(&Table::new(rows), 3, &[Position::Def]).unwrap();
        assert_eq!(best.len(), TOP_N);
        assert!(best.iter().all(|p| p.position == Position::Def));
        assert_eq!(best[0].name, "Def79");
    }

    #[test]
    fn latest_value_uses_last_row_of_max_gameweek() {
        let table = Table::new(vec![
            row("Salah", Position::Mid, 5, 4.0, 125.0),
            row("Salah", Position::Mid, 4, 4.0, 120.0),
            row("Salah", Position::Mid, 5, 4.0, 126.0),
        ]);
        let best = best_performers_by_points(&table, 3, &[Position::Mid]).unwrap();
        assert_eq!(best[0].value, 126.0);
        assert_eq!(best[0].total_points, 12.0);
    }

    #[test]
    fn value_ranking_rounds_to_one_decimal() {
        let table = two_week_table();
        let best = best_performers_by_value(&table, 2, &Position::ALL).unwrap();
        assert_eq!(best[0].name, "Raya");
        assert_eq!(best[0].points_per_value, Some(0.3));
        assert!(best.len() <= TOP_N);
    }

    #[test]
    fn zero_price_is_division_undefined() {
        let table = Table::new(vec![row("Free", Position::Gk, 1, 3.0, 0.0)]);
        assert_eq!(
            best_performers_by_value(&table, 1, &Position::ALL),
            Err(EngineError::DivisionUndefined {
                name: "Free".to_string()
            })
        );
        // Excluded positions never reach the division.
        assert!(best_performers_by_value(&table, 1, &[Position::Mid])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn derived_table_includes_ratio_only_for_value_ranking() {
        let table = two_week_table();
        let points = best_performers_by_points(&table, 2, &Position::ALL).unwrap();
        let value = best_performers_by_value(&table, 2, &Position::ALL).unwrap();
        assert_eq!(DerivedTable::from(points.as_slice()).columns().len(), 5);
        assert_eq!(DerivedTable::from(value.as_slice()).columns().len(), 6);
    }
}
