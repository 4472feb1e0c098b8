// Integration tests, one module per endpoint group

mod change_detection;
mod ingestion;
mod tiles;
mod zoning;
