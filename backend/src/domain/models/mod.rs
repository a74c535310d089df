pub mod pill;
pub mod schedule;
pub mod user;
