use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{TeamScope, TeamTimesheetEntry, TimesheetEntry},
    types::TeamTimesheetRow,
    utils::sql,
};

const TIMESHEET_COLUMNS: &str = r#"
    id,
    user_id,
    clock_in_time,
    clock_out_time,
    working_seconds,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait TimesheetStore: Send + Sync {
    /// Latest entry of the user that has not been clocked out.
    async fn find_open(&self, user_id: Uuid) -> Result<Option<TimesheetEntry>>;

    async fn clock_in(&self, user_id: Uuid, clock_in_time: DateTime<Utc>)
    -> Result<TimesheetEntry>;

    /// Closes an open entry; `None` if it was closed in the meantime.
    async fn clock_out(
        &self,
        entry_id: Uuid,
        clock_out_time: DateTime<Utc>,
        working_seconds: i64,
    ) -> Result<Option<TimesheetEntry>>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TimesheetEntry>>;

    async fn list_for_team(&self, scope: TeamScope) -> Result<Vec<TeamTimesheetEntry>>;
}

#[derive(Clone)]
pub struct TimesheetRepository {
    pool: PgPool,
}

impl TimesheetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimesheetStore for TimesheetRepository {
    async fn find_open(&self, user_id: Uuid) -> Result<Option<TimesheetEntry>> {
        let entry = sqlx::query_as::<_, TimesheetEntry>(&sql(&format!(
            r#"
            SELECT {TIMESHEET_COLUMNS}
            FROM
                timesheet_entries
            WHERE
                user_id = ?
                AND clock_out_time IS NULL
            ORDER BY
                clock_in_time DESC
            LIMIT 1
            "#
        )))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn clock_in(
        &self,
        user_id: Uuid,
        clock_in_time: DateTime<Utc>,
    ) -> Result<TimesheetEntry> {
        let entry = TimesheetEntry::open(user_id, clock_in_time);

        let entry = sqlx::query_as::<_, TimesheetEntry>(&sql(&format!(
            r#"
            INSERT INTO
                timesheet_entries (
                    id,
                    user_id,
                    clock_in_time,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?)
            RETURNING {TIMESHEET_COLUMNS}
            "#
        )))
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.clock_in_time)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn clock_out(
        &self,
        entry_id: Uuid,
        clock_out_time: DateTime<Utc>,
        working_seconds: i64,
    ) -> Result<Option<TimesheetEntry>> {
        let entry = sqlx::query_as::<_, TimesheetEntry>(&sql(&format!(
            r#"
            UPDATE
                timesheet_entries
            SET
                clock_out_time = ?,
                working_seconds = ?,
                updated_at = ?
            WHERE
                id = ?
                AND clock_out_time IS NULL
            RETURNING {TIMESHEET_COLUMNS}
            "#
        )))
        .bind(clock_out_time)
        .bind(working_seconds)
        .bind(Utc::now())
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TimesheetEntry>> {
        let entries = sqlx::query_as::<_, TimesheetEntry>(&sql(&format!(
            r#"
            SELECT {TIMESHEET_COLUMNS}
            FROM
                timesheet_entries
            WHERE
                user_id = ?
            ORDER BY
                clock_in_time DESC
            "#
        )))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn list_for_team(&self, scope: TeamScope) -> Result<Vec<TeamTimesheetEntry>> {
        let rows = sqlx::query_as::<_, TeamTimesheetRow>(&sql(r#"
            SELECT
                t.id,
                t.user_id,
                t.clock_in_time,
                t.clock_out_time,
                t.working_seconds,
                t.created_at,
                t.updated_at,
                u.username,
                u.email,
                u.first_name,
                u.last_name,
                e.id AS employee_id,
                e.role,
                e.department,
                e.job_title
            FROM
                timesheet_entries t
                JOIN users u ON u.id = t.user_id
                LEFT JOIN employees e ON e.user_id = t.user_id
            WHERE
                ?::uuid IS NULL
                OR e.manager_id = ?
            ORDER BY
                t.clock_in_time DESC
        "#))
        .bind(scope.manager_filter())
        .bind(scope.manager_filter())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TeamTimesheetEntry::from).collect())
    }
}
