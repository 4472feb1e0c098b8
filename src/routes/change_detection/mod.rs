//! Change detection between two scenes or two days of statistics.

pub mod db;
pub mod models;
pub mod views;
