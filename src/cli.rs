//! # Command Line Interface
//!
//! Turns flags into engine parameters and prints the resulting tables.

use crate::config::AppConfig;
use crate::data::{Metric, Position, Table};
use crate::engine::{
    best_performers_by_points, best_performers_by_value, largest_ownership_changes,
    largest_price_changes, parse_fields, query_table, DerivedTable, EngineError, Overview,
    PositionTable, Query, SortOrder,
};
use crate::stats::{player_series, StatChart};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

/// Fantasy Premier League weekly stats
#[derive(Parser, Debug)]
#[command(name = "fpl-stats")]
#[command(about = "Rankings, deltas and custom tables over FPL gameweek data")]
pub struct Cli {
    /// URL or path of the season CSV (overrides the config file)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Optional TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Maximum rows to print per table
    #[arg(short, long)]
    pub limit: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// List every player name in the season
    Players,
    /// Per-position rankings plus price and ownership movers
    Overview {
        /// Gameweeks to look back
        #[arg(long)]
        weeks: Option<u32>,
    },
    /// Best performers by total points
    BestPoints {
        #[arg(long)]
        weeks: Option<u32>,
        /// Positions to include (GK,DEF,MID,FWD)
        #[arg(long, value_delimiter = ',', default_values_t = Position::ALL)]
        positions: Vec<Position>,
    },
    /// Best performers by points per unit of price
    BestValue {
        #[arg(long)]
        weeks: Option<u32>,
        #[arg(long, value_delimiter = ',', default_values_t = Position::ALL)]
        positions: Vec<Position>,
    },
    /// Largest price rises over the window
    PriceChanges {
        #[arg(long)]
        weeks: Option<u32>,
    },
    /// Largest ownership rises over the window
    OwnershipChanges {
        #[arg(long)]
        weeks: Option<u32>,
    },
    /// Filter, aggregate and sort a custom table
    Table {
        /// Columns to show, in order
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(long)]
        value_min: Option<f64>,
        #[arg(long)]
        value_max: Option<f64>,
        #[arg(long)]
        gw_min: Option<u32>,
        #[arg(long)]
        gw_max: Option<u32>,
        /// Positions to include; all when empty
        #[arg(long, value_delimiter = ',')]
        positions: Vec<Position>,
        /// Column to sort by; must be one of the selected columns
        #[arg(long)]
        sort_by: Option<String>,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
        /// Metrics to take from the latest gameweek instead of summing
        #[arg(long, value_delimiter = ',')]
        snapshot_columns: Option<Vec<String>>,
    },
    /// Per-player gameweek series for one or more statistics
    Series {
        #[arg(long, value_delimiter = ',')]
        players: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        stats: Vec<String>,
        /// Trailing average window in gameweeks
        #[arg(long)]
        trailing: Option<usize>,
    },
}

/// Runs one command against a loaded table.
pub struct CliHandler {
    table: Table,
    config: AppConfig,
    format: OutputFormat,
    limit: usize,
}

impl CliHandler {
    pub fn new(
        table: Table,
        config: AppConfig,
        format: OutputFormat,
        limit: Option<usize>,
    ) -> Self {
        let limit = limit.unwrap_or(config.display_rows);
        Self {
            table,
            config,
            format,
            limit,
        }
    }

    pub fn handle_command(&self, command: Commands) -> Result<()> {
        let output = self.render_command(command)?;
        println!("{output}");
        Ok(())
    }

    /// Evaluate a command and return what would be printed.
    pub fn render_command(&self, command: Commands) -> Result<String> {
        debug!(?command, "handling command");
        match command {
            Commands::Players => {
                let players = self.table.players();
                match self.format {
                    OutputFormat::Json => Ok(serde_json::to_string_pretty(&players)?),
                    OutputFormat::Table => Ok(players.join("\n")),
                }
            }
            Commands::Overview { weeks } => {
                let weeks = weeks.unwrap_or(self.config.overview_weeks);
                let overview = Overview::compute(&self.table, weeks)?;
                self.render_overview(&overview)
            }
            Commands::BestPoints { weeks, positions } => {
                let weeks = weeks.unwrap_or(self.config.overview_weeks);
                let best = best_performers_by_points(&self.table, weeks, &positions)?;
                self.render_table("Best Performers by Points", &DerivedTable::from(best.as_slice()))
            }
            Commands::BestValue { weeks, positions } => {
                let weeks = weeks.unwrap_or(self.config.overview_weeks);
                let best = best_performers_by_value(&self.table, weeks, &positions)?;
                self.render_table(
                    "Best Performers by Point Value",
                    &DerivedTable::from(best.as_slice()),
                )
            }
            Commands::PriceChanges { weeks } => {
                let weeks = weeks.unwrap_or(self.config.overview_weeks);
                let changes = largest_price_changes(&self.table, weeks)?;
                self.render_table("Largest Price Changes", &DerivedTable::from(changes.as_slice()))
            }
            Commands::OwnershipChanges { weeks } => {
                let weeks = weeks.unwrap_or(self.config.overview_weeks);
                let changes = largest_ownership_changes(&self.table, weeks)?;
                self.render_table(
                    "Largest Ownership Changes",
                    &DerivedTable::from(changes.as_slice()),
                )
            }
            Commands::Table {
                columns,
                value_min,
                value_max,
                gw_min,
                gw_max,
                positions,
                sort_by,
                order,
                snapshot_columns,
            } => {
                let mut query = self.build_query(
                    &columns,
                    (value_min, value_max),
                    (gw_min, gw_max),
                    positions,
                    sort_by.as_deref(),
                    order,
                )?;
                if let Some(snapshots) = snapshot_columns {
                    query = query.with_snapshot_columns(parse_fields(&snapshots)?);
                }
                let result = query_table(&self.table, &query)?;
                self.render_table("Table", &result)
            }
            Commands::Series {
                players,
                stats,
                trailing,
            } => {
                let stats = stats
                    .iter()
                    .map(|s| s.parse::<Metric>().map_err(EngineError::InvalidParameter))
                    .collect::<Result<Vec<_>, _>>()?;
                let charts = player_series(&self.table, &players, &stats, trailing);
                self.render_charts(&charts)
            }
        }
    }

    /// Missing range bounds default to the loaded table's full range.
    fn build_query(
        &self,
        columns: &[String],
        value: (Option<f64>, Option<f64>),
        gw: (Option<u32>, Option<u32>),
        positions: Vec<Position>,
        sort_by: Option<&str>,
        order: SortOrder,
    ) -> Result<Query, EngineError> {
        let (value_lo, value_hi) = self.table.value_bounds().unwrap_or((0.0, 0.0));
        let (gw_lo, gw_hi) = self.table.gw_bounds().unwrap_or((1, 1));

        let mut query = Query::new(parse_fields(columns)?)
            .with_value_range(value.0.unwrap_or(value_lo), value.1.unwrap_or(value_hi))
            .with_gw_range(gw.0.unwrap_or(gw_lo), gw.1.unwrap_or(gw_hi))
            .with_positions(positions);
        if let Some(sort_by) = sort_by {
            let field = sort_by.parse().map_err(EngineError::InvalidParameter)?;
            query = query.sorted_by(field, order);
        }
        Ok(query)
    }

    fn render_table(&self, title: &str, table: &DerivedTable) -> Result<String> {
        let table = table.clone().truncated(self.limit);
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&table)?),
            OutputFormat::Table if table.is_empty() => Ok(format!("{title}\nNo data")),
            OutputFormat::Table => {
                let df = table
                    .to_dataframe()
                    .context("failed to build display frame")?;
                Ok(format!("{title}\n{df}"))
            }
        }
    }

    fn render_overview(&self, overview: &Overview) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(overview)?);
        }
        let mut sections = Vec::new();
        for ranking in &overview.by_points {
            let title = format!("Best Performers by Points ({})", ranking.position);
            sections.push(self.render_position(&title, ranking)?);
        }
        for ranking in &overview.by_value {
            let title = format!("Best Performers by Point Value ({})", ranking.position);
            sections.push(self.render_position(&title, ranking)?);
        }
        sections.push(self.render_table(
            "Largest Price Changes",
            &DerivedTable::from(overview.price_changes.as_slice()),
        )?);
        sections.push(self.render_table(
            "Largest Ownership Changes",
            &DerivedTable::from(overview.ownership_changes.as_slice()),
        )?);
        Ok(sections.join("\n\n"))
    }

    fn render_position(&self, title: &str, ranking: &PositionTable) -> Result<String> {
        match &ranking.error {
            Some(err) => Ok(format!("{title}\n{err}")),
            None => self.render_table(title, &DerivedTable::from(ranking.performers.as_slice())),
        }
    }

    fn render_charts(&self, charts: &[StatChart]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(charts)?);
        }
        if charts.is_empty() {
            return Ok("No Data to Display".to_string());
        }
        let mut out = Vec::new();
        for chart in charts {
            out.push(chart.title.clone());
            for series in &chart.series {
                let points: Vec<String> = series
                    .points
                    .iter()
                    .map(|p| format!("GW{}={:.2}", p.gw, p.value))
                    .collect();
                out.push(format!("  {}: {}", series.player, points.join(" ")));
            }
        }
        Ok(out.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;

    fn handler(format: OutputFormat) -> CliHandler {
        let table = Table::new(vec![
            Row::new("Haaland", "MCI", Position::Fwd, 1)
                .with(Metric::TotalPoints, 5.0)
                .with(Metric::Value, 120.0),
            Row::new("Haaland", "MCI", Position::Fwd, 2)
                .with(Metric::TotalPoints, 10.0)
                .with(Metric::Value, 125.0),
        ]);
        CliHandler::new(table, AppConfig::default(), format, None)
    }

    #[test]
    fn parses_table_command() {
        let cli = Cli::try_parse_from([
            "fpl-stats",
            "--format",
            "json",
            "table",
            "--columns",
            "name,value,total_points",
            "--positions",
            "FWD,MID",
            "--sort-by",
            "total_points",
            "--order",
            "asc",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Table {
                columns,
                positions,
                order,
                ..
            } => {
                assert_eq!(columns.len(), 3);
                assert_eq!(positions, vec![Position::Fwd, Position::Mid]);
                assert_eq!(order, SortOrder::Ascending);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn best_points_defaults_to_every_position() {
        let cli = Cli::try_parse_from(["fpl-stats", "best-points", "--weeks", "3"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::BestPoints {
                weeks: Some(3),
                positions: Position::ALL.to_vec()
            }
        );
    }

    #[test]
    fn table_command_renders_json_records() {
        let out = handler(OutputFormat::Json)
            .render_command(Commands::Table {
                columns: vec!["name".into(), "value".into(), "total_points".into()],
                value_min: None,
                value_max: None,
                gw_min: None,
                gw_max: None,
                positions: Vec::new(),
                sort_by: Some("total_points".into()),
                order: SortOrder::Descending,
                snapshot_columns: None,
            })
            .unwrap();
        let records: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(records[0]["name"], "Haaland");
        assert_eq!(records[0]["value"], 125.0);
        assert_eq!(records[0]["total_points"], 15.0);
    }

    #[test]
    fn missing_sort_column_is_an_error() {
        let err = handler(OutputFormat::Table)
            .render_command(Commands::Table {
                columns: vec!["name".into()],
                value_min: None,
                value_max: None,
                gw_min: None,
                gw_max: None,
                positions: Vec::new(),
                sort_by: None,
                order: SortOrder::Descending,
                snapshot_columns: None,
            })
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<EngineError>(),
            Some(&EngineError::MissingParameter("sort column"))
        );
    }

    #[test]
    fn snapshot_columns_take_latest_gameweek() {
        let out = handler(OutputFormat::Json)
            .render_command(Commands::Table {
                columns: vec!["name".into(), "total_points".into()],
                value_min: None,
                value_max: None,
                gw_min: None,
                gw_max: None,
                positions: Vec::new(),
                sort_by: Some("total_points".into()),
                order: SortOrder::Descending,
                snapshot_columns: Some(vec!["total_points".into()]),
            })
            .unwrap();
        let records: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(records[0]["total_points"], 10.0);
    }

    #[test]
    fn overview_reports_zero_price_inline() {
        let table = Table::new(vec![
            Row::new("Free", "BUR", Position::Gk, 1)
                .with(Metric::TotalPoints, 2.0)
                .with(Metric::Value, 0.0),
            Row::new("Haaland", "MCI", Position::Fwd, 1)
                .with(Metric::TotalPoints, 5.0)
                .with(Metric::Value, 120.0),
        ]);
        let out = CliHandler::new(table, AppConfig::default(), OutputFormat::Table, None)
            .render_command(Commands::Overview { weeks: Some(1) })
            .unwrap();
        assert!(out.contains(
            "Best Performers by Point Value (GK)\n\
             Points per value undefined for 'Free': price is zero"
        ));
        assert!(out.contains("Best Performers by Point Value (FWD)"));
    }

    #[test]
    fn empty_results_render_no_data() {
        let out = handler(OutputFormat::Table)
            .render_command(Commands::PriceChanges { weeks: Some(5) })
            .unwrap();
        assert_eq!(out, "Largest Price Changes\nNo data");

        let out = handler(OutputFormat::Table)
            .render_command(Commands::Series {
                players: Vec::new(),
                stats: vec!["total_points".into()],
                trailing: None,
            })
            .unwrap();
        assert_eq!(out, "No Data to Display");
    }
}
