//! FPL Stats - rankings, deltas and custom tables over Fantasy Premier League gameweek data
//!
//! The season CSV is loaded once into an immutable [`data::Table`]; every view is a
//! pure function of that table and its parameters.

pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod stats;
