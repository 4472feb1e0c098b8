pub mod common;
pub mod config;
pub mod provider;
pub mod routes;
