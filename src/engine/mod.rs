//! Snapshot engine: indicator math, per-symbol fetch, and the per-tick pipeline.

pub mod fetcher;
pub mod indicators;
pub mod pipeline;

pub use pipeline::{Pipeline, PipelineSettings};
