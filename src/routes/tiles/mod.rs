pub mod fallback;
pub mod proxy;
pub mod styling;
pub mod views;
