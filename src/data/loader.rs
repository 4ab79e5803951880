//! CSV Data Loader Module
//! Fetches the weekly player CSV and converts it into a typed `Table` using Polars.

use crate::data::model::{Metric, Position, Row, Table};
use polars::prelude::*;
use reqwest::blocking::Client;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Columns every season file must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["name", "team", "position", "GW", "value"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Failed to fetch data from {url}: HTTP {status}")]
    BadStatus { url: String, status: u16 },
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    #[error("No data loaded")]
    NoData,
}

/// Where the season CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(String),
}

impl DataSource {
    /// Anything that looks like an http(s) URL is fetched, everything else is a path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataSource::Url(raw.to_string())
        } else {
            DataSource::File(raw.to_string())
        }
    }
}

/// Handles fetching and decoding of the season CSV.
pub struct DataLoader {
    client: Client,
}

impl DataLoader {
    pub fn new(timeout: Duration) -> Result<Self, LoaderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Load a table from either a URL or a local file.
    pub fn load(&self, source: &DataSource) -> Result<Table, LoaderError> {
        let df = match source {
            DataSource::Url(url) => {
                let bytes = self.fetch(url)?;
                Self::parse_csv(bytes)?
            }
            DataSource::File(path) => Self::load_csv(Path::new(path))?,
        };
        Self::to_table(&df)
    }

    /// Single GET; any non-success status is an error.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, LoaderError> {
        info!(url, "fetching season data");
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoaderError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = resp.bytes()?.to_vec();
        debug!(bytes = bytes.len(), "fetched season data");
        Ok(bytes)
    }

    /// Decode CSV bytes held in memory.
    pub fn parse_csv(bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }

    /// Load a CSV file from disk.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        info!(path = %path.display(), "reading season data");
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Convert a decoded frame into typed rows.
    ///
    /// Rows without a name, a positive gameweek or a known position are skipped.
    /// Metric columns absent from the file load as zero.
    pub fn to_table(df: &DataFrame) -> Result<Table, LoaderError> {
        if df.height() == 0 {
            return Err(LoaderError::NoData);
        }

        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for required in REQUIRED_COLUMNS {
            if !present.iter().any(|c| c == required) {
                return Err(LoaderError::MissingColumn(required.to_string()));
            }
        }

        let names = string_column(df, "name")?;
        let teams = string_column(df, "team")?;
        let positions = string_column(df, "position")?;
        let gws = float_column(df, "GW")?;

        let mut metrics: Vec<(Metric, Vec<Option<f64>>)> = Vec::with_capacity(Metric::COUNT);
        for metric in Metric::ALL {
            if present.iter().any(|c| c == metric.column_name()) {
                metrics.push((metric, float_column(df, metric.column_name())?));
            } else {
                warn!(column = metric.column_name(), "column missing, filling with zeros");
            }
        }

        let mut rows = Vec::with_capacity(df.height());
        let mut skipped = 0usize;
        for i in 0..df.height() {
            let (Some(name), Some(gw)) = (names[i].as_deref(), gws[i]) else {
                skipped += 1;
                continue;
            };
            if !gw.is_finite() || gw < 1.0 {
                skipped += 1;
                continue;
            }
            let Some(position) = positions[i].as_deref().and_then(|p| p.parse::<Position>().ok())
            else {
                skipped += 1;
                continue;
            };

            let team = teams[i].as_deref().unwrap_or_default();
            let mut row = Row::new(name, team, position, gw as u32);
            for (metric, values) in &metrics {
                row.set(*metric, values[i].filter(|v| !v.is_nan()).unwrap_or(0.0));
            }
            rows.push(row);
        }

        if skipped > 0 {
            warn!(skipped, "skipped rows without name, gameweek or known position");
        }
        info!(rows = rows.len(), "season table loaded");
        Ok(Table::new(rows))
    }
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, LoaderError> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let ca = series.str()?;
    Ok(ca
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect())
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, LoaderError> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let ca = series.f64()?;
    Ok(ca.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "name,position,team,xP,assists,bonus,bps,clean_sheets,creativity,goals_conceded,goals_scored,ict_index,influence,minutes,red_cards,saves,selected,threat,total_points,transfers_balance,value,yellow_cards,GW
Erling Haaland,FWD,Man City,6.5,0,3,45,0,10.2,0,2,15.1,60.4,90,0,0,5000000,80.0,13,100000,140,0,1
Alisson,GK,Liverpool,3.0,0,0,20,1,0.0,0,0,1.2,12.0,90,0,3,800000,0.0,6,-2000,55,0,1
Someone,AM,Luton,0,0,0,0,0,0,0,0,0,0,0,0,0,10,0,0,0,5,0,1
";

    #[test]
    fn parses_csv_into_typed_rows() {
        let df = DataLoader::parse_csv(SAMPLE.as_bytes().to_vec()).unwrap();
        let table = DataLoader::to_table(&df).unwrap();

        assert_eq!(table.len(), 2);
        let haaland = &table.rows()[0];
        assert_eq!(haaland.name, "Erling Haaland");
        assert_eq!(haaland.position, Position::Fwd);
        assert_eq!(haaland.gw, 1);
        assert_eq!(haaland.value(), 140.0);
        assert_eq!(haaland.metric(Metric::TotalPoints), 13.0);
        assert_eq!(haaland.metric(Metric::ExpectedPoints), 6.5);
        assert_eq!(table.rows()[1].metric(Metric::TransfersBalance), -2000.0);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let df = DataLoader::parse_csv(b"name,team,position,GW\nA,B,MID,1\n".to_vec()).unwrap();
        match DataLoader::to_table(&df) {
            Err(LoaderError::MissingColumn(col)) => assert_eq!(col, "value"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn missing_metric_columns_default_to_zero() {
        let df = DataLoader::parse_csv(
            b"name,team,position,GW,value,total_points\nA,B,MID,2,50,7\n".to_vec(),
        )
        .unwrap();
        let table = DataLoader::to_table(&df).unwrap();
        assert_eq!(table.rows()[0].metric(Metric::TotalPoints), 7.0);
        assert_eq!(table.rows()[0].metric(Metric::Threat), 0.0);
    }

    #[test]
    fn source_detection() {
        assert_eq!(
            DataSource::parse("https://example.com/gw.csv"),
            DataSource::Url("https://example.com/gw.csv".to_string())
        );
        assert_eq!(
            DataSource::parse("data/merged_gw.csv"),
            DataSource::File("data/merged_gw.csv".to_string())
        );
    }
}
