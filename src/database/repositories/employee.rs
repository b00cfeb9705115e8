use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{Employee, EmployeeChanges, User},
    utils::sql,
};

const EMPLOYEE_COLUMNS: &str = r#"
    id,
    user_id,
    role,
    department,
    job_title,
    hire_date,
    leave_balance,
    manager_id,
    password_reset_required,
    temp_password,
    created_at,
    updated_at
"#;

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>>;

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Employee>>;

    /// Account matching `identifier` by email or username, both
    /// case-insensitive, with its employee profile if it has one. An email
    /// match wins over a username that happens to equal it.
    async fn find_by_email_or_username(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, Option<Employee>)>>;

    async fn update(&self, id: Uuid, changes: &EmployeeChanges) -> Result<Option<Employee>>;

    /// Removes the profile; reports keep existing with their manager unset.
    async fn delete(&self, id: Uuid) -> Result<Option<Employee>>;
}

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for EmployeeRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&sql(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&sql(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE user_id = ?"
        )))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn find_by_email_or_username(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, Option<Employee>)>> {
        let user = sqlx::query_as::<_, User>(&sql(r#"
            SELECT
                id,
                username,
                email,
                password_hash,
                first_name,
                last_name,
                is_active,
                is_staff,
                created_at,
                updated_at
            FROM
                users
            WHERE
                LOWER(email) = LOWER(?)
                OR LOWER(username) = LOWER(?)
            ORDER BY
                LOWER(email) = LOWER(?) DESC,
                created_at
            LIMIT 1
        "#))
        .bind(identifier)
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        match user {
            Some(user) => {
                let employee = self.find_by_user_id(user.id).await?;
                Ok(Some((user, employee)))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, changes: &EmployeeChanges) -> Result<Option<Employee>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Employee>(&sql(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ? FOR UPDATE"
        )))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut employee) = current else {
            return Ok(None);
        };
        employee.apply(changes);

        let employee = sqlx::query_as::<_, Employee>(&sql(&format!(
            r#"
            UPDATE
                employees
            SET
                role = ?,
                department = ?,
                job_title = ?,
                manager_id = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING {EMPLOYEE_COLUMNS}
            "#
        )))
        .bind(employee.role)
        .bind(&employee.department)
        .bind(&employee.job_title)
        .bind(employee.manager_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(employee))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&sql(&format!(
            "DELETE FROM employees WHERE id = ? RETURNING {EMPLOYEE_COLUMNS}"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }
}
