//! Pill lifecycle: create, modify, stop, delete, and the per-owner count
//! limit. Input validation happens before any storage access; existence
//! checks precede authorization checks, which precede state conflicts.

use chrono::NaiveDate;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::pill::{
    parse_date, parse_time, Pill, PillDraft, RecurrenceRule, DEFAULT_PILL_COLOR, MAX_ACTIVE_PILLS,
    MAX_PILL_NAME_CHARS,
};
use crate::domain::user_service::UserService;
use crate::storage::{DbConnection, PillRepository};
use shared::{CreatePillRequest, ModifyPillRequest, PillCountResponse};

/// Service for managing pill definitions
#[derive(Clone)]
pub struct PillService {
    pill_repository: PillRepository,
    user_service: UserService,
}

impl PillService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            pill_repository: PillRepository::new(db.clone()),
            user_service: UserService::new(db),
        }
    }

    /// Add a pill owned by the caller.
    pub async fn add_pill(&self, owner_id: i64, request: &CreatePillRequest) -> DomainResult<Pill> {
        info!("Adding pill {:?} for user {}", request.pill_name, owner_id);

        let draft = validate_draft(
            owner_id,
            &request.pill_name,
            request.color.as_deref(),
            request.take_interval,
            request.day.as_deref(),
            request.specific.as_deref(),
            &request.time_list,
            &request.start,
            request.end.as_deref(),
        )?;

        self.user_service.ensure_user_exists(owner_id).await?;
        self.ensure_below_limit(owner_id).await?;

        let pill = self.pill_repository.store_pill(&draft).await?;
        Ok(pill)
    }

    /// Add a pill on behalf of a linked member; the member becomes the owner.
    pub async fn add_member_pill(
        &self,
        caller_id: i64,
        member_id: i64,
        request: &CreatePillRequest,
    ) -> DomainResult<Pill> {
        info!(
            "User {} adding pill {:?} for member {}",
            caller_id, request.pill_name, member_id
        );

        let draft = validate_draft(
            member_id,
            &request.pill_name,
            request.color.as_deref(),
            request.take_interval,
            request.day.as_deref(),
            request.specific.as_deref(),
            &request.time_list,
            &request.start,
            request.end.as_deref(),
        )?;

        self.user_service.ensure_user_exists(member_id).await?;
        self.user_service
            .ensure_member_link(caller_id, member_id)
            .await?;
        self.ensure_below_limit(member_id).await?;

        let pill = self.pill_repository.store_pill(&draft).await?;
        Ok(pill)
    }

    /// How many pills a user holds and how many more they may add.
    pub async fn get_pill_count(&self, user_id: i64) -> DomainResult<PillCountResponse> {
        self.user_service.ensure_user_exists(user_id).await?;
        let used = self.pill_repository.count_active_pills(user_id).await?;
        Ok(PillCountResponse {
            used,
            remaining: MAX_ACTIVE_PILLS.saturating_sub(used),
        })
    }

    /// Pill count for a linked member.
    pub async fn get_member_pill_count(
        &self,
        caller_id: i64,
        member_id: i64,
    ) -> DomainResult<PillCountResponse> {
        self.user_service.ensure_user_exists(member_id).await?;
        self.user_service
            .ensure_member_link(caller_id, member_id)
            .await?;
        let used = self.pill_repository.count_active_pills(member_id).await?;
        Ok(PillCountResponse {
            used,
            remaining: MAX_ACTIVE_PILLS.saturating_sub(used),
        })
    }

    /// Replace a pill's definition. Forward-only: persisted check rows for
    /// dates before the change are left untouched.
    pub async fn modify_pill(
        &self,
        caller_id: i64,
        pill_id: i64,
        request: &ModifyPillRequest,
    ) -> DomainResult<Pill> {
        info!("User {} modifying pill {}", caller_id, pill_id);

        let pill = self.get_owned_pill(caller_id, pill_id).await?;

        let draft = validate_draft(
            pill.user_id,
            &request.pill_name,
            request.color.as_deref().or(Some(&pill.color)),
            request.take_interval,
            request.day.as_deref(),
            request.specific.as_deref(),
            &request.time_list,
            &request.start,
            request.end.as_deref(),
        )?;

        self.pill_repository.update_pill(pill_id, &draft).await?;
        self.pill_repository
            .get_pill(pill_id)
            .await?
            .ok_or(DomainError::NonExistentPill)
    }

    /// Stop a pill from `stop_date` forward, keeping earlier history.
    pub async fn stop_pill(
        &self,
        caller_id: i64,
        pill_id: i64,
        stop_date: NaiveDate,
    ) -> DomainResult<Pill> {
        info!("User {} stopping pill {} at {}", caller_id, pill_id, stop_date);

        let pill = self.get_owned_pill(caller_id, pill_id).await?;
        if pill.is_stopped {
            return Err(DomainError::AlreadyStoppedPill);
        }

        self.pill_repository.stop_pill(pill_id, stop_date).await?;
        self.pill_repository
            .get_pill(pill_id)
            .await?
            .ok_or(DomainError::NonExistentPill)
    }

    /// Hard-delete a pill and every check row it ever materialized.
    pub async fn delete_pill(&self, caller_id: i64, pill_id: i64) -> DomainResult<()> {
        info!("User {} deleting pill {}", caller_id, pill_id);

        self.get_owned_pill(caller_id, pill_id).await?;
        self.pill_repository.delete_pill(pill_id).await?;
        Ok(())
    }

    /// Resolve a pill and verify the caller may act on it. Existence first,
    /// then authorization, per the error-ordering contract.
    async fn get_owned_pill(&self, caller_id: i64, pill_id: i64) -> DomainResult<Pill> {
        let pill = self
            .pill_repository
            .get_pill(pill_id)
            .await?
            .ok_or(DomainError::NonExistentPill)?;

        if !self.user_service.can_access(caller_id, pill.user_id).await? {
            return Err(DomainError::NoPillUser);
        }
        Ok(pill)
    }

    async fn ensure_below_limit(&self, owner_id: i64) -> DomainResult<()> {
        let used = self.pill_repository.count_active_pills(owner_id).await?;
        if used >= MAX_ACTIVE_PILLS {
            return Err(DomainError::PillCountOver);
        }
        Ok(())
    }
}

/// Validate request fields into a draft without touching storage.
#[allow(clippy::too_many_arguments)]
fn validate_draft(
    owner_id: i64,
    pill_name: &str,
    color: Option<&str>,
    take_interval: Option<u32>,
    day: Option<&[String]>,
    specific: Option<&[String]>,
    time_list: &[String],
    start: &str,
    end: Option<&str>,
) -> DomainResult<PillDraft> {
    let name_chars = pill_name.chars().count();
    if name_chars == 0 || name_chars > MAX_PILL_NAME_CHARS {
        return Err(DomainError::InvalidPillName);
    }

    let rule = RecurrenceRule::resolve(take_interval, day, specific)?;

    if time_list.is_empty() {
        return Err(DomainError::InvalidInput("time_list"));
    }
    let mut times = Vec::with_capacity(time_list.len());
    for raw in time_list {
        let time = parse_time(raw).ok_or(DomainError::InvalidInput("time_list"))?;
        times.push(time);
    }
    times.sort();
    times.dedup();

    let start = parse_date(start).ok_or(DomainError::InvalidInput("start"))?;
    let end = match end {
        Some(raw) => Some(parse_date(raw).ok_or(DomainError::InvalidInput("end"))?),
        None => None,
    };
    if let Some(end_date) = end {
        if end_date < start {
            return Err(DomainError::InvalidInput("end"));
        }
    }

    Ok(PillDraft {
        user_id: owner_id,
        name: pill_name.to_string(),
        color: color.unwrap_or(DEFAULT_PILL_COLOR).to_string(),
        rule,
        times,
        start,
        end,
    })
}
