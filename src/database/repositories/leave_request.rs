use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{LeaveRequest, LeaveRequestInput, LeaveStatus, TeamLeaveRequest, TeamScope},
    types::TeamLeaveRow,
    utils::sql,
};

const LEAVE_COLUMNS: &str = r#"
    id,
    user_id,
    start_date,
    end_date,
    reason,
    status,
    approved_by,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait LeaveRequestStore: Send + Sync {
    async fn create(&self, user_id: Uuid, input: LeaveRequestInput) -> Result<LeaveRequest>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LeaveRequest>>;

    /// Whether the user holds a non-rejected request intersecting
    /// `[start, end]` (inclusive).
    async fn has_overlap(&self, user_id: Uuid, start: NaiveDate, end: NaiveDate)
    -> Result<bool>;

    /// Moves a PENDING request to `status`; `None` when it was no longer
    /// pending (or is gone).
    async fn decide(
        &self,
        id: Uuid,
        status: LeaveStatus,
        approver: Uuid,
    ) -> Result<Option<LeaveRequest>>;

    /// Newest leave first: start date then end date, both descending.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<LeaveRequest>>;

    async fn list_for_team(&self, scope: TeamScope) -> Result<Vec<TeamLeaveRequest>>;
}

#[derive(Clone)]
pub struct LeaveRequestRepository {
    pool: PgPool,
}

impl LeaveRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveRequestStore for LeaveRequestRepository {
    async fn create(&self, user_id: Uuid, input: LeaveRequestInput) -> Result<LeaveRequest> {
        let request = LeaveRequest::new(user_id, input);

        let leave_request = sqlx::query_as::<_, LeaveRequest>(&sql(&format!(
            r#"
            INSERT INTO
                leave_requests (
                    id,
                    user_id,
                    start_date,
                    end_date,
                    reason,
                    status,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {LEAVE_COLUMNS}
            "#
        )))
        .bind(request.id)
        .bind(request.user_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(leave_request)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LeaveRequest>> {
        let leave_request = sqlx::query_as::<_, LeaveRequest>(&sql(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(leave_request)
    }

    async fn has_overlap(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(&sql(r#"
            SELECT EXISTS (
                SELECT
                    1
                FROM
                    leave_requests
                WHERE
                    user_id = ?
                    AND status <> ?
                    AND start_date <= ?
                    AND end_date >= ?
            )
        "#))
        .bind(user_id)
        .bind(LeaveStatus::Rejected)
        .bind(end)
        .bind(start)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn decide(
        &self,
        id: Uuid,
        status: LeaveStatus,
        approver: Uuid,
    ) -> Result<Option<LeaveRequest>> {
        let leave_request = sqlx::query_as::<_, LeaveRequest>(&sql(&format!(
            r#"
            UPDATE
                leave_requests
            SET
                status = ?,
                approved_by = ?,
                updated_at = ?
            WHERE
                id = ?
                AND status = ?
            RETURNING {LEAVE_COLUMNS}
            "#
        )))
        .bind(status)
        .bind(approver)
        .bind(Utc::now())
        .bind(id)
        .bind(LeaveStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(leave_request)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<LeaveRequest>> {
        let requests = sqlx::query_as::<_, LeaveRequest>(&sql(&format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM
                leave_requests
            WHERE
                user_id = ?
            ORDER BY
                start_date DESC,
                end_date DESC
            "#
        )))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn list_for_team(&self, scope: TeamScope) -> Result<Vec<TeamLeaveRequest>> {
        let rows = sqlx::query_as::<_, TeamLeaveRow>(&sql(r#"
            SELECT
                lr.id,
                lr.user_id,
                lr.start_date,
                lr.end_date,
                lr.reason,
                lr.status,
                lr.approved_by,
                lr.created_at,
                lr.updated_at,
                u.username,
                u.email,
                u.first_name,
                u.last_name,
                e.id AS employee_id,
                e.role,
                e.department,
                e.job_title
            FROM
                leave_requests lr
                JOIN users u ON u.id = lr.user_id
                LEFT JOIN employees e ON e.user_id = lr.user_id
            WHERE
                ?::uuid IS NULL
                OR e.manager_id = ?
            ORDER BY
                lr.start_date DESC,
                lr.end_date DESC
        "#))
        .bind(scope.manager_filter())
        .bind(scope.manager_filter())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TeamLeaveRequest::from).collect())
    }
}
