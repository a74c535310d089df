//! # Storage Module
//!
//! SQLite-backed persistence: connection management, schema setup, and one
//! repository per relation. Repositories return `anyhow::Result`; the domain
//! layer translates failures into its own error type.

pub mod db;
pub mod repositories;

pub use db::DbConnection;
pub use repositories::{PillRepository, ScheduleRepository, UserRepository};
