pub mod pill_repository;
pub mod schedule_repository;
pub mod user_repository;

pub use pill_repository::PillRepository;
pub use schedule_repository::ScheduleRepository;
pub use user_repository::UserRepository;
