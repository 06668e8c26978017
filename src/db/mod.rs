//! SQLite persistence for players and their saved session reports.

pub mod connection;
pub mod helpers;
pub mod migrations;
pub mod models;
pub mod repositories;

pub use connection::Database;
pub use models::{Player, ReportSummary};
