//! User lookups, caregiving member links, and the authorization gate every
//! cross-identity read or mutation must pass.

use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::user::{MemberLink, User};
use crate::storage::{DbConnection, UserRepository};

/// Service for users and member links
#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
}

impl UserService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            user_repository: UserRepository::new(db),
        }
    }

    /// Create a user row. Called from the social-login exchange boundary;
    /// also the seam tests use to provision identities.
    pub async fn create_user(&self, username: &str) -> DomainResult<User> {
        info!("Creating user {:?}", username);
        let user = self.user_repository.store_user(username).await?;
        Ok(user)
    }

    /// Resolve a user or fail with `NonExistentUser`.
    pub async fn get_user(&self, user_id: i64) -> DomainResult<User> {
        self.user_repository
            .get_user(user_id)
            .await?
            .ok_or(DomainError::NonExistentUser)
    }

    pub async fn ensure_user_exists(&self, user_id: i64) -> DomainResult<()> {
        self.get_user(user_id).await.map(|_| ())
    }

    /// Whether `caller_id` may act on data owned by `owner_id`: self-access,
    /// or a registered member link from caller to owner.
    pub async fn can_access(&self, caller_id: i64, owner_id: i64) -> DomainResult<bool> {
        if caller_id == owner_id {
            return Ok(true);
        }
        let linked = self
            .user_repository
            .has_member_link(caller_id, owner_id)
            .await?;
        Ok(linked)
    }

    /// Gate for member-scoped reads: fail with `NoMember` unless the caller
    /// is the member or holds a link to them. Existence of the member must
    /// be checked by the caller first so unknown-user keeps precedence.
    pub async fn ensure_member_link(&self, caller_id: i64, member_id: i64) -> DomainResult<()> {
        if self.can_access(caller_id, member_id).await? {
            Ok(())
        } else {
            Err(DomainError::NoMember)
        }
    }

    /// List the members a user may manage, ordered by display name.
    pub async fn list_members(&self, user_id: i64) -> DomainResult<Vec<MemberLink>> {
        self.ensure_user_exists(user_id).await?;
        let links = self.user_repository.list_member_links(user_id).await?;
        Ok(links)
    }

    /// Register a member link from `user_id` to `member_id`.
    pub async fn add_member(
        &self,
        user_id: i64,
        member_id: i64,
        member_name: &str,
    ) -> DomainResult<MemberLink> {
        if member_name.is_empty() {
            return Err(DomainError::InvalidInput("member_name"));
        }
        if user_id == member_id {
            return Err(DomainError::InvalidInput("member_id"));
        }

        self.ensure_user_exists(user_id).await?;
        self.ensure_user_exists(member_id).await?;

        let created = self
            .user_repository
            .store_member_link(user_id, member_id, member_name)
            .await?;
        if !created {
            return Err(DomainError::AlreadyMember);
        }

        info!("Linked member {} to user {}", member_id, user_id);

        let links = self.user_repository.list_member_links(user_id).await?;
        links
            .into_iter()
            .find(|l| l.member_id == member_id)
            .ok_or_else(|| DomainError::Storage(anyhow::anyhow!("member link vanished after insert")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> UserService {
        let db = DbConnection::init_test().await.expect("test db");
        UserService::new(db)
    }

    #[tokio::test]
    async fn test_get_unknown_user_fails() {
        let service = setup().await;
        let result = service.get_user(42).await;
        assert!(matches!(result, Err(DomainError::NonExistentUser)));
    }

    #[tokio::test]
    async fn test_self_access_is_always_allowed() {
        let service = setup().await;
        let user = service.create_user("haeun").await.unwrap();
        assert!(service.can_access(user.id, user.id).await.unwrap());
        service.ensure_member_link(user.id, user.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_unlinked_users_cannot_access_each_other() {
        let service = setup().await;
        let a = service.create_user("a").await.unwrap();
        let b = service.create_user("b").await.unwrap();

        assert!(!service.can_access(a.id, b.id).await.unwrap());
        let result = service.ensure_member_link(a.id, b.id).await;
        assert!(matches!(result, Err(DomainError::NoMember)));
    }

    #[tokio::test]
    async fn test_link_grants_directed_access() {
        let service = setup().await;
        let carer = service.create_user("carer").await.unwrap();
        let dependent = service.create_user("dependent").await.unwrap();

        let link = service
            .add_member(carer.id, dependent.id, "grandpa")
            .await
            .unwrap();
        assert_eq!(link.member_name, "grandpa");

        assert!(service.can_access(carer.id, dependent.id).await.unwrap());
        // The reverse direction stays closed
        assert!(!service.can_access(dependent.id, carer.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_link_is_a_state_conflict() {
        let service = setup().await;
        let a = service.create_user("a").await.unwrap();
        let b = service.create_user("b").await.unwrap();

        service.add_member(a.id, b.id, "b").await.unwrap();
        let result = service.add_member(a.id, b.id, "b").await;
        assert!(matches!(result, Err(DomainError::AlreadyMember)));
    }

    #[tokio::test]
    async fn test_self_link_is_rejected() {
        let service = setup().await;
        let a = service.create_user("a").await.unwrap();
        let result = service.add_member(a.id, a.id, "me").await;
        assert!(matches!(result, Err(DomainError::InvalidInput("member_id"))));
    }

    #[tokio::test]
    async fn test_link_to_unknown_member_fails_on_existence_first() {
        let service = setup().await;
        let a = service.create_user("a").await.unwrap();
        let result = service.add_member(a.id, 999, "ghost").await;
        assert!(matches!(result, Err(DomainError::NonExistentUser)));
    }
}
