//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite user store
//! - Session record operations (the session store)

mod database;
mod models;

pub use database::Database;
pub use models::*;
