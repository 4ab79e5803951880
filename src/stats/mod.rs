//! Stats module - per-player gameweek series and trailing averages

mod series;

pub use series::{player_series, trailing_average, PlayerSeries, SeriesPoint, StatChart};
