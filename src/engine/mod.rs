//! Engine module - pure aggregations over a loaded season table

mod changes;
mod derived;
mod error;
mod overview;
mod query;
mod rankings;

pub use changes::{largest_ownership_changes, largest_price_changes, Change};
pub use derived::{Cell, DerivedTable};
pub use error::EngineError;
pub use overview::{Overview, PositionTable};
pub use query::{parse_fields, query_table, Query, SortOrder};
pub use rankings::{
    best_performers_by_points, best_performers_by_value, windowed_filter, Performer, TOP_N,
};
