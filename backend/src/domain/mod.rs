//! # Domain Module
//!
//! Business logic for the medication reminder: models, the pure recurrence
//! expander, and one service per concern. Services own their repositories
//! and receive the acting user id explicitly on every call; nothing here
//! reads ambient request state.

pub mod errors;
pub mod models;
pub mod pill_service;
pub mod recurrence;
pub mod schedule_service;
pub mod user_service;

pub use errors::{DomainError, DomainResult};
pub use pill_service::PillService;
pub use schedule_service::ScheduleService;
pub use user_service::UserService;
