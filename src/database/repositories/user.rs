use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{Employee, NewAccount, NewEmployee, User},
    utils::sql,
};

const USER_COLUMNS: &str = r#"
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
"#;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Case-insensitive.
    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Inserts the account and its employee profile in one transaction.
    async fn provision(&self, account: NewAccount, employee: NewEmployee)
    -> Result<(User, Employee)>;

    /// Stores the new hash and clears the forced-reset flag and temporary
    /// credential together.
    async fn complete_password_reset(&self, user_id: Uuid, password_hash: &str) -> Result<()>;

    async fn update_names(
        &self,
        user_id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User>;

    async fn set_active(&self, user_id: Uuid, active: bool) -> Result<()>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&sql(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&sql(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        )))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(&sql(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(username) = LOWER(?))",
        ))
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(&sql(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER(?))",
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn provision(
        &self,
        account: NewAccount,
        employee: NewEmployee,
    ) -> Result<(User, Employee)> {
        let user = User::new(account);
        let employee = Employee::new(user.id, employee);

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&sql(&format!(
            r#"
            INSERT INTO
                users (
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
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        )))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        let employee = sqlx::query_as::<_, Employee>(&sql(r#"
            INSERT INTO
                employees (
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
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
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
        "#))
        .bind(employee.id)
        .bind(employee.user_id)
        .bind(employee.role)
        .bind(&employee.department)
        .bind(&employee.job_title)
        .bind(employee.hire_date)
        .bind(employee.leave_balance)
        .bind(employee.manager_id)
        .bind(employee.password_reset_required)
        .bind(&employee.temp_password)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((user, employee))
    }

    async fn complete_password_reset(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(&sql(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?",
        ))
        .bind(password_hash)
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(&sql(r#"
            UPDATE
                employees
            SET
                password_reset_required = FALSE,
                temp_password = NULL,
                updated_at = ?
            WHERE
                user_id = ?
        "#))
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn update_names(
        &self,
        user_id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&sql(&format!(
            r#"
            UPDATE
                users
            SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                updated_at = ?
            WHERE
                id = ?
            RETURNING {USER_COLUMNS}
            "#
        )))
        .bind(first_name)
        .bind(last_name)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_active(&self, user_id: Uuid, active: bool) -> Result<()> {
        sqlx::query(&sql(
            "UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?",
        ))
        .bind(active)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
