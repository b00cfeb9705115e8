use std::sync::{Arc, LazyLock};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{
    CreateAccountInput, CreateAccountResponse, NewAccount, NewEmployee, Role,
};
use crate::database::repositories::Stores;
use crate::error::AppError;
use crate::services::actor::Actor;
use crate::services::auth::hash_password;
use crate::services::lookup_cache::LookupCache;
use crate::services::notifier::{Notifier, OutgoingEmail};
use crate::services::policy;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]{1,150}$").expect("valid username regex"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

const CREDENTIALS_SUBJECT: &str = "Your Employee Account Credentials";

/// 12 random bytes, URL-safe base64 without padding (16 characters).
pub fn generate_temporary_password() -> String {
    let bytes: [u8; 12] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn validate_account_fields(input: &CreateAccountInput) -> Result<(), AppError> {
    if !USERNAME_RE.is_match(&input.username) {
        return Err(AppError::validation(
            "username",
            "Enter a valid username of at most 150 letters, digits and @/./+/-/_ characters.",
        ));
    }
    if input.email.len() > 254 || !EMAIL_RE.is_match(&input.email) {
        return Err(AppError::validation("email", "Enter a valid email address."));
    }
    if input.department.trim().is_empty() {
        return Err(AppError::validation("department", "This field may not be blank."));
    }
    Ok(())
}

fn credentials_body(username: &str, temporary_password: &str, reset_url: &str) -> String {
    format!(
        "Hello,\n\n\
         Your account has been created. Please log in using:\n\
         Username: {username}\n\
         Password: {temporary_password}\n\n\
         You must reset your password on first login:\n\
         {reset_url}\n"
    )
}

#[derive(Clone)]
pub struct ProvisioningService {
    stores: Stores,
    cache: LookupCache,
    notifier: Arc<dyn Notifier>,
    config: Config,
}

impl ProvisioningService {
    pub fn new(
        stores: Stores,
        cache: LookupCache,
        notifier: Arc<dyn Notifier>,
        config: Config,
    ) -> Self {
        Self {
            stores,
            cache,
            notifier,
            config,
        }
    }

    /// Creates an account and its employee profile with a temporary
    /// credential, then mails the credential to the new employee.
    pub async fn create_account(
        &self,
        actor: &Actor,
        input: CreateAccountInput,
    ) -> Result<CreateAccountResponse, AppError> {
        policy::require_account_creator(actor.role())?;

        let mut input = input;
        input.username = input.username.trim().to_string();
        input.email = input.email.trim().to_lowercase();
        input.department = input.department.trim().to_string();

        validate_account_fields(&input)?;

        if self.stores.users.username_exists(&input.username).await? {
            return Err(AppError::validation(
                "username",
                "This username is already taken.",
            ));
        }
        if self.stores.users.email_exists(&input.email).await? {
            return Err(AppError::validation(
                "email",
                "This email is already registered.",
            ));
        }

        let actor_department = match actor.role() {
            Some(Role::Manager) => {
                self.cache
                    .department_of(actor.user_id(), self.stores.employees.as_ref())
                    .await?
            }
            _ => None,
        };
        policy::check_account_creation(
            actor.role(),
            actor_department.as_deref(),
            input.role,
            &input.department,
        )?;

        let manager_id = self.resolve_manager(actor, &input).await?;

        let temporary_password = generate_temporary_password();
        let password_hash =
            hash_password(&temporary_password, self.config.password_hash_cost).await?;

        let (user, employee) = self
            .stores
            .users
            .provision(
                NewAccount {
                    username: input.username.clone(),
                    email: input.email.clone(),
                    password_hash,
                    first_name: input.first_name.unwrap_or_default(),
                    last_name: input.last_name.unwrap_or_default(),
                    is_staff: input.role == Role::Manager,
                },
                NewEmployee {
                    role: input.role,
                    department: input.department,
                    job_title: input.job_title,
                    hire_date: input.hire_date.unwrap_or_else(|| Utc::now().date_naive()),
                    manager_id,
                    password_reset_required: true,
                    temp_password: Some(temporary_password.clone()),
                },
            )
            .await?;

        log::info!(
            "User {} provisioned account '{}' ({}, {})",
            actor.user_id(),
            user.username,
            employee.role,
            employee.department
        );

        let notification_sent = self
            .send_credentials(&user.email, &user.username, &temporary_password)
            .await;

        self.cache.invalidate_user(&user).await;

        Ok(CreateAccountResponse {
            user: user.into(),
            employee: employee.summary(),
            manager_id: employee.manager_id,
            password_reset_required: employee.password_reset_required,
            notification_sent,
        })
    }

    async fn resolve_manager(
        &self,
        actor: &Actor,
        input: &CreateAccountInput,
    ) -> Result<Option<Uuid>, AppError> {
        let identifier = input
            .manager_email_or_username
            .as_deref()
            .map(str::trim)
            .filter(|identifier| !identifier.is_empty());

        match identifier {
            Some(identifier) => {
                let manager = self
                    .cache
                    .resolve_manager(identifier, self.stores.employees.as_ref())
                    .await?
                    .ok_or_else(|| {
                        AppError::validation(
                            "manager_email_or_username",
                            "No valid manager found with this email/username",
                        )
                    })?;
                Ok(Some(manager.id))
            }
            // Managers' hires report to them unless told otherwise
            None => Ok(actor
                .employee()
                .filter(|employee| employee.role == Role::Manager)
                .map(|employee| employee.employee_id)),
        }
    }

    async fn send_credentials(&self, email: &str, username: &str, temporary_password: &str) -> bool {
        let message = OutgoingEmail {
            to: email.to_string(),
            subject: CREDENTIALS_SUBJECT.to_string(),
            body: credentials_body(
                username,
                temporary_password,
                &self.config.password_reset_url(),
            ),
        };

        match self.notifier.send(&message).await {
            Ok(()) => true,
            Err(err) => {
                log::error!(
                    "Failed to send credentials email to {}: {}",
                    email,
                    err.describe()
                );
                false
            }
        }
    }
}
