//! Engine error kinds.

use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by the aggregation engine. All are recoverable: the caller keeps
/// its previous view. An empty result is not an error.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum EngineError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Points per value undefined for '{name}': price is zero")]
    DivisionUndefined { name: String },
}
