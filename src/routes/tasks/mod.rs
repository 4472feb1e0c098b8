pub mod models;
pub mod orchestrator;
pub mod views;
