//! Productivity zoning: provider vegetation maps tracked per field.

pub mod db;
pub mod models;
pub mod tracker;
pub mod views;
