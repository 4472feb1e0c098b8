pub mod models;
pub mod resolver;
pub mod views;
