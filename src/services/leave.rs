use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::database::models::{LeaveRequest, LeaveRequestInput, LeaveStatus, TeamLeaveRequest};
use crate::database::repositories::Stores;
use crate::error::AppError;
use crate::services::actor::Actor;
use crate::services::policy;

pub const MAX_REASON_LENGTH: usize = 2500;

/// Date checks that need no store access. `today` is the UTC date.
pub fn validate_leave_window(
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> Result<(), AppError> {
    if start_date < today {
        return Err(AppError::validation(
            "start_date",
            "Leave start date cannot be in the past.",
        ));
    }
    if start_date > end_date {
        return Err(AppError::validation(
            "start_date",
            "Leave start date cannot be after leave end date.",
        ));
    }
    Ok(())
}

pub fn validate_reason(reason: &str) -> Result<(), AppError> {
    if reason.trim().is_empty() {
        return Err(AppError::validation("reason", "This field may not be blank."));
    }
    if reason.chars().count() > MAX_REASON_LENGTH {
        return Err(AppError::validation(
            "reason",
            format!(
                "Ensure this field has no more than {} characters.",
                MAX_REASON_LENGTH
            ),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct LeaveService {
    stores: Stores,
}

impl LeaveService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        input: LeaveRequestInput,
    ) -> Result<LeaveRequest, AppError> {
        validate_leave_window(input.start_date, input.end_date, Utc::now().date_naive())?;
        validate_reason(&input.reason)?;

        let user_id = actor.user_id();
        if self
            .stores
            .leave_requests
            .has_overlap(user_id, input.start_date, input.end_date)
            .await?
        {
            return Err(AppError::invalid("You have an overlapping leave request."));
        }

        let request = self.stores.leave_requests.create(user_id, input).await?;
        log::info!(
            "User {} requested leave {} to {}",
            user_id,
            request.start_date,
            request.end_date
        );

        Ok(request)
    }

    pub async fn approve(&self, actor: &Actor, request_id: Uuid) -> Result<LeaveRequest, AppError> {
        self.decide(actor, request_id, LeaveStatus::Approved).await
    }

    pub async fn reject(&self, actor: &Actor, request_id: Uuid) -> Result<LeaveRequest, AppError> {
        self.decide(actor, request_id, LeaveStatus::Rejected).await
    }

    async fn decide(
        &self,
        actor: &Actor,
        request_id: Uuid,
        status: LeaveStatus,
    ) -> Result<LeaveRequest, AppError> {
        let not_pending = || AppError::conflict("Only pending requests may be approved or rejected");

        let request = self
            .stores
            .leave_requests
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave request not found"))?;

        if request.status.is_terminal() {
            return Err(not_pending());
        }

        let requester_manager_id = self
            .stores
            .employees
            .find_by_user_id(request.user_id)
            .await?
            .and_then(|employee| employee.manager_id);
        policy::check_leave_decision(actor, requester_manager_id)?;

        // Conditional on PENDING; a concurrent decision makes this miss
        let decided = self
            .stores
            .leave_requests
            .decide(request_id, status, actor.user_id())
            .await?
            .ok_or_else(not_pending)?;

        log::info!(
            "Leave request {} set to {} by user {}",
            decided.id,
            decided.status,
            actor.user_id()
        );

        Ok(decided)
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<LeaveRequest>, AppError> {
        Ok(self
            .stores
            .leave_requests
            .list_for_user(actor.user_id())
            .await?)
    }

    pub async fn list_team(&self, actor: &Actor) -> Result<Vec<TeamLeaveRequest>, AppError> {
        let scope = policy::team_scope(actor)?;
        Ok(self.stores.leave_requests.list_for_team(scope).await?)
    }
}
