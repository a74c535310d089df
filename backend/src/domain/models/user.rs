//! User and member-link domain models.

use shared::MemberDto;

/// An authenticated identity. Rows are created on first social-login
/// exchange (outside this service) and never hard-deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A directed caregiving link: `user_id` may read and manage
/// `member_id`'s pills and schedules.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberLink {
    pub user_id: i64,
    pub member_id: i64,
    /// Display name the owner uses for this member.
    pub member_name: String,
    pub created_at: String,
}

impl MemberLink {
    pub fn to_dto(&self) -> MemberDto {
        MemberDto {
            member_id: self.member_id,
            member_name: self.member_name.clone(),
        }
    }
}
