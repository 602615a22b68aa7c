//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite connection pool and migrations
//! - User and attendance queries

mod database;
mod models;

pub use database::Database;
pub use models::*;

#[cfg(test)]
mod database_test;
