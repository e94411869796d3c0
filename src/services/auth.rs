//! Authentication, registration and session service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use validator::Validate;

use crate::{
    config::{AuthConfig, RootAccountConfig},
    error::{AppError, AppResult},
    models::account::{Account, NewAccount, ProvisionAccount, RegisterAccount, SessionClaims},
    repository::Repository,
};

use super::accounts::{generate_lending_token, TOKEN_ATTEMPTS};

static HANDLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("handle pattern is valid"));

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Passwords rejected outright
const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "passw0rd", "12345678", "123456789",
    "1234567890", "qwerty123", "qwertyuiop", "iloveyou", "sunshine", "princess",
    "football", "baseball", "welcome1", "admin123", "letmein1", "trustno1",
    "superman", "starwars", "whatever", "dragon123", "monkey123", "abc12345",
    "michael1", "1q2w3e4r", "qazwsxedc", "zaq12wsx", "changeme", "testpass123",
];

/// NFKC-normalize and validate a handle
pub fn normalize_handle(handle: &str) -> AppResult<String> {
    let handle: String = handle.trim().nfkc().collect();
    if handle.is_empty() || handle.chars().count() > 150 {
        return Err(AppError::Validation(
            "Handle must be 1 to 150 characters".to_string(),
        ));
    }
    if !HANDLE_PATTERN.is_match(&handle) {
        return Err(AppError::Validation(
            "Handle may only contain letters, numbers and @/./+/-/_ characters".to_string(),
        ));
    }
    Ok(handle)
}

/// Password strength policy; collects every failed rule
pub fn check_password_strength(handle: &str, password: &str) -> AppResult<()> {
    let mut problems = Vec::new();
    let lowered = password.to_lowercase();
    let handle = handle.to_lowercase();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push("This password is too common.".to_string());
    }
    if handle.chars().count() >= 3
        && lowered.chars().count() >= 3
        && (lowered.contains(&handle) || handle.contains(&lowered))
    {
        problems.push("The password is too similar to the handle.".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join(" ")))
    }
}

fn handle_taken_error() -> AppError {
    AppError::Validation("An account with that handle already exists.".to_string())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Self-registration. The account waits for admin approval.
    pub async fn register(&self, request: RegisterAccount) -> AppResult<Account> {
        request.validate()?;

        if request.password != request.password_confirm {
            return Err(AppError::Validation(
                "The two password fields didn't match.".to_string(),
            ));
        }

        let account = self
            .create_account(&request.handle, &request.password, false, false)
            .await?;
        tracing::info!(account_id = account.id, handle = %account.handle, "Account registered, pending approval");
        Ok(account)
    }

    /// Administrative provisioning. The account is approved immediately.
    pub async fn provision(&self, request: ProvisionAccount) -> AppResult<Account> {
        request.validate()?;

        let account = self
            .create_account(&request.handle, &request.password, true, request.is_admin)
            .await?;
        tracing::info!(account_id = account.id, handle = %account.handle, "Account provisioned");
        Ok(account)
    }

    async fn create_account(
        &self,
        handle: &str,
        password: &str,
        is_approved: bool,
        is_admin: bool,
    ) -> AppResult<Account> {
        let handle = normalize_handle(handle)?;

        if self.handle_taken(&handle).await? {
            return Err(handle_taken_error());
        }

        check_password_strength(&handle, password)?;

        let mut new_account = NewAccount {
            handle,
            password_hash: hash_password(password)?,
            is_approved,
            is_admin,
            lending_token: generate_lending_token(),
        };
        self.insert_account(&mut new_account).await
    }

    async fn handle_taken(&self, handle: &str) -> AppResult<bool> {
        Ok(self.repository.accounts.get_by_handle(handle).await?.is_some())
    }

    /// Insert, drawing a fresh lending token when the previous one collided.
    /// A handle that was taken in the meantime is a validation error.
    async fn insert_account(&self, account: &mut NewAccount) -> AppResult<Account> {
        for attempt in 1..=TOKEN_ATTEMPTS {
            match self.repository.accounts.create(account).await {
                Err(AppError::Conflict(_)) => {
                    if self.handle_taken(&account.handle).await? {
                        return Err(handle_taken_error());
                    }
                    tracing::warn!(handle = %account.handle, attempt, "Lending token collision, retrying");
                    account.lending_token = generate_lending_token();
                }
                other => return other,
            }
        }

        Err(AppError::Internal(
            "Could not generate a unique lending token".to_string(),
        ))
    }

    /// Check credentials and open a session. Returns the bearer token.
    pub async fn authenticate(&self, handle: &str, password: &str) -> AppResult<(String, Account)> {
        let invalid = || AppError::Authentication("Invalid handle or password".to_string());

        let handle: String = handle.trim().nfkc().collect();
        let account = self
            .repository
            .accounts
            .get_by_handle(&handle)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &account.password_hash)? {
            tracing::warn!(handle = %handle, "Rejected login: bad password");
            return Err(invalid());
        }

        if !account.can_use_dashboard() {
            tracing::info!(account_id = account.id, "Rejected login: pending approval");
            return Err(AppError::PendingApproval);
        }

        let token = self.create_token_for_account(&account)?;
        tracing::info!(account_id = account.id, "Session opened");
        Ok((token, account))
    }

    fn create_token_for_account(&self, account: &Account) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = SessionClaims {
            sub: account.handle.clone(),
            account_id: account.id,
            is_admin: account.is_admin,
            session_version: account.session_version,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Resolve a bearer token to a live, dashboard-capable account
    pub async fn account_from_token(&self, token: &str) -> AppResult<Account> {
        let claims = SessionClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let account = self
            .repository
            .accounts
            .get_by_id(claims.account_id)
            .await?
            .ok_or_else(|| AppError::Authentication("Unknown account".to_string()))?;

        if account.session_version != claims.session_version {
            return Err(AppError::Authentication("Session has ended".to_string()));
        }
        if !account.can_use_dashboard() {
            return Err(AppError::PendingApproval);
        }

        Ok(account)
    }

    /// End every session of the account
    pub async fn logout(&self, account: &Account) -> AppResult<()> {
        self.repository.accounts.bump_session_version(account.id).await?;
        tracing::info!(account_id = account.id, "Sessions revoked");
        Ok(())
    }

    /// Create the configured root administrator if it does not exist yet
    pub async fn ensure_root_account(&self, root: Option<&RootAccountConfig>) -> AppResult<()> {
        let Some(root) = root.filter(|r| !r.username.trim().is_empty() && !r.password.is_empty())
        else {
            tracing::warn!(
                "ROOT_USERNAME and ROOT_PASSWORD environment variables not set or empty. Skipping root account creation."
            );
            return Ok(());
        };

        let handle = normalize_handle(&root.username)?;
        if self.repository.accounts.get_by_handle(&handle).await?.is_some() {
            tracing::info!("Root account '{}' already exists", handle);
            return Ok(());
        }

        // Operator-supplied credentials skip the strength policy
        let mut new_account = NewAccount {
            handle,
            password_hash: hash_password(&root.password)?,
            is_approved: true,
            is_admin: true,
            lending_token: generate_lending_token(),
        };
        let account = self.insert_account(&mut new_account).await?;
        tracing::info!("Root account '{}' created", account.handle);
        Ok(())
    }
}
