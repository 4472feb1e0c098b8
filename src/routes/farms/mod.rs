//! Farms and fields belong to the farm-management application. The imagery
//! layer only reads them.

pub mod db;
pub mod fields;
