use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use anyhow::anyhow;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{
    AuthResponse, LoginInput, NewAccount, NewEmployee, ResetInitialPasswordInput, Role,
    TokenResponse, User,
};
use crate::database::repositories::Stores;
use crate::error::AppError;
use crate::services::lookup_cache::LookupCache;

pub const MIN_PASSWORD_LENGTH: usize = 8;
const BOOTSTRAP_ADMIN_DEPARTMENT: &str = "Administration";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // account id
    pub username: String,
    pub role: Option<Role>,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            return ready(Err(AppError::Unauthorized(
                "Missing or invalid authorization header".to_string(),
            )));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            log::error!("Config is not registered as app data");
            return ready(Err(AppError::internal_server_error()));
        };

        ready(decode_token(token, &config.jwt_secret))
    }
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

/// bcrypt off the async workers.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| anyhow!(e))?
        .map_err(|e| AppError::internal_server_error_message(e.to_string()))
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    let verified = tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| anyhow!(e))?;

    // A malformed stored hash counts as a mismatch
    Ok(verified.unwrap_or(false))
}

#[derive(Clone)]
pub struct AuthService {
    stores: Stores,
    cache: LookupCache,
    config: Config,
}

impl AuthService {
    pub fn new(stores: Stores, cache: LookupCache, config: Config) -> Self {
        Self {
            stores,
            cache,
            config,
        }
    }

    fn invalid_credentials() -> AppError {
        AppError::Unauthorized("Invalid credentials".to_string())
    }

    pub async fn login(&self, input: LoginInput) -> Result<AuthResponse, AppError> {
        let user = self
            .stores
            .users
            .find_by_username(input.username.trim())
            .await?
            .ok_or_else(Self::invalid_credentials)?;

        if !verify_password(&input.password, &user.password_hash).await? || !user.is_active {
            log::info!("Failed login attempt for '{}'", user.username);
            return Err(Self::invalid_credentials());
        }

        let employee = self.stores.employees.find_by_user_id(user.id).await?;

        if employee
            .as_ref()
            .is_some_and(|employee| employee.password_reset_required)
        {
            return Err(AppError::PasswordResetRequired {
                reset_url: self.config.password_reset_url(),
            });
        }

        let token = self.generate_token(&user, employee.as_ref().map(|e| e.role))?;
        log::info!("User '{}' logged in", user.username);

        Ok(AuthResponse {
            token,
            user: user.into(),
            employee: employee.map(|e| e.summary()),
        })
    }

    pub async fn refresh(&self, claims: &Claims) -> Result<TokenResponse, AppError> {
        let user = self
            .stores
            .users
            .find_by_id(claims.user_id())
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::Unauthorized("Account is no longer active".to_string()))?;

        let role = self
            .stores
            .employees
            .find_by_user_id(user.id)
            .await?
            .map(|employee| employee.role);

        Ok(TokenResponse {
            token: self.generate_token(&user, role)?,
        })
    }

    /// Replaces the temporary credential handed out at provisioning.
    pub async fn reset_initial_password(
        &self,
        input: ResetInitialPasswordInput,
    ) -> Result<(), AppError> {
        if input.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::validation(
                "new_password",
                format!(
                    "Password must be at least {} characters long.",
                    MIN_PASSWORD_LENGTH
                ),
            ));
        }
        if input.new_password == input.temporary_password {
            return Err(AppError::validation(
                "new_password",
                "New password must differ from the temporary password.",
            ));
        }

        let invalid = || AppError::invalid("Invalid username or temporary password.");

        let user = self
            .stores
            .users
            .find_by_username(input.username.trim())
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(invalid)?;

        let pending = self
            .stores
            .employees
            .find_by_user_id(user.id)
            .await?
            .is_some_and(|employee| employee.password_reset_required);

        if !pending || !verify_password(&input.temporary_password, &user.password_hash).await? {
            return Err(invalid());
        }

        let password_hash = hash_password(&input.new_password, self.config.password_hash_cost).await?;
        self.stores
            .users
            .complete_password_reset(user.id, &password_hash)
            .await?;

        self.cache.invalidate_user(&user).await;
        log::info!("User '{}' replaced their temporary password", user.username);

        Ok(())
    }

    pub fn generate_token(&self, user: &User, role: Option<Role>) -> Result<String, AppError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::days(self.config.jwt_expiration_days))
            .ok_or_else(|| AppError::internal_server_error_message("Token expiry overflow"))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role,
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )
        .map_err(|e| AppError::internal_server_error_message(e.to_string()))
    }

    /// Creates the configured administrator if its username is free.
    pub async fn ensure_bootstrap_admin(&self) -> anyhow::Result<Option<User>> {
        let Some(admin) = &self.config.bootstrap_admin else {
            return Ok(None);
        };

        if self.stores.users.username_exists(&admin.username).await? {
            log::info!("Bootstrap admin '{}' already exists", admin.username);
            return Ok(None);
        }

        let password_hash = hash_password(&admin.password, self.config.password_hash_cost)
            .await
            .map_err(|e| anyhow!("{}", e))?;

        let (user, _) = self
            .stores
            .users
            .provision(
                NewAccount {
                    username: admin.username.clone(),
                    email: admin.email.to_lowercase(),
                    password_hash,
                    first_name: String::new(),
                    last_name: String::new(),
                    is_staff: true,
                },
                NewEmployee {
                    role: Role::Admin,
                    department: BOOTSTRAP_ADMIN_DEPARTMENT.to_string(),
                    job_title: None,
                    hire_date: Utc::now().date_naive(),
                    manager_id: None,
                    password_reset_required: false,
                    temp_password: None,
                },
            )
            .await?;

        log::info!("Created bootstrap admin '{}'", user.username);
        Ok(Some(user))
    }
}
