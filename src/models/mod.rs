//! Domain models shared across Market Pulse.

pub mod series;
pub mod snapshot;

pub use series::{PricePoint, PriceSeries};
pub use snapshot::{FetchFailure, SeriesLeg, Snapshot, SnapshotOutcome};
