//! rowshift - row materialization for database-to-database transfer.
//!
//! Provisions a health-checked source connection from a descriptor, runs a
//! query to completion and turns every cell into a SQL literal token.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
