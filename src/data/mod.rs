//! Data module - season CSV loading and the typed table model

mod loader;
mod model;

pub use loader::{DataLoader, DataSource, LoaderError, REQUIRED_COLUMNS};
pub use model::{Field, Metric, Position, Row, Table};
