//! CivicOne: a REST backend for citizen-reported civic issues.
//!
//! Citizens submit issues with an optional photo, administrators assign them
//! to departments, and departments update their status. Everything is stored
//! in a single SQLite table; photos live under the public `uploads/` directory.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pool;
pub mod routes;
pub mod server;
pub mod state;
pub mod upload;
