//! Analysis aggregator: turns provider statistics, zoning results and hourly
//! weather into persisted per-field and per-farm records.

pub mod aggregator;
pub mod models;
pub mod snapshots;
pub mod sources;
pub mod store;
pub mod weather;
