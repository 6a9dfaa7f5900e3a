//! Data layer module
//!
//! Handles game metadata persistence in SQLite.

mod database;
mod models;

pub use database::Database;
pub use models::*;
