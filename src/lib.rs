//! Imports SIO agricultural field-survey sites from spreadsheets, attaches
//! their field photos, and serves them to the web map as GeoJSON.

pub mod api;
pub mod cli;
pub mod database_ops;
pub mod media;
pub mod normalization;
pub mod orchestrator;
pub mod table;
pub mod tracing;

pub mod util {
    pub mod env;
}

pub use orchestrator::{run_import, ImportConfig, ImportSummary};
