//! Readings at a single location: raw index values from one view, a
//! multi-index summary from the clearest recent scene, and clustering options.

pub mod models;
pub mod views;
