//! Domain error type shared by all services.
//!
//! Every expected failure is a variant callers can match on; only genuinely
//! unexpected faults (storage unreachable, corrupt rows) travel through the
//! `Storage` variant and surface as a 500 at the HTTP boundary.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user does not exist")]
    NonExistentUser,

    #[error("pill does not exist")]
    NonExistentPill,

    #[error("caller has no member link to the requested user")]
    NoMember,

    #[error("caller may not act on this pill")]
    NoPillUser,

    #[error("active pill limit reached")]
    PillCountOver,

    #[error("pill is already stopped")]
    AlreadyStoppedPill,

    #[error("member link already exists")]
    AlreadyMember,

    #[error("pill name must be 1 to 10 characters")]
    InvalidPillName,

    #[error("missing or malformed field: {0}")]
    InvalidInput(&'static str),

    #[error("no schedule instance exists for that pill, date and time")]
    NonExistentSchedule,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    /// True for failures callers can correct; false for infrastructure faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, DomainError::Storage(_))
    }
}
