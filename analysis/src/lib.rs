//! Match telemetry aggregation.
//!
//! A [`telemetry::Recording`] is folded by the [`engine`] into per-player statistics,
//! a round-by-round classification, a positional heatmap and radar snapshots. An
//! optional second pass extracts dense [`frames`].

pub mod telemetry;
pub mod recording;

pub mod players;
pub mod rounds;
pub mod heatmap;
pub mod snapshots;
pub mod frames;
pub mod summary;

pub mod engine;

pub use engine::{analyse, AnalysisError, Config};
