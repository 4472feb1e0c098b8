//! Scheduled ingestion, triggered by an external scheduler over HTTP.

pub mod auth;
pub mod jobs;
pub mod models;
pub mod views;
