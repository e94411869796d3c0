//! Account settings, lending token rotation and approval

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;

use crate::{
    error::{AppError, AppResult},
    models::account::{Account, AccountShort, VisibilitySettings},
    repository::Repository,
};

/// Attempts made before giving up on a token collision
pub(crate) const TOKEN_ATTEMPTS: usize = 3;

/// Fresh lending token: 16 random bytes, URL-safe base64 (22 chars)
pub fn generate_lending_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
}

impl AccountsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    fn not_found(id: i64) -> AppError {
        AppError::NotFound(format!("Account with id {} not found", id))
    }

    /// Save the owner's visibility toggles
    pub async fn update_visibility(
        &self,
        account: &Account,
        settings: VisibilitySettings,
    ) -> AppResult<Account> {
        let updated = self
            .repository
            .accounts
            .update_visibility(account.id, &settings)
            .await?
            .ok_or_else(|| Self::not_found(account.id))?;

        tracing::info!(account_id = account.id, ?settings, "Visibility settings updated");
        Ok(updated)
    }

    /// Replace the lending token; the old public URL stops working at once
    pub async fn regenerate_token(&self, account: &Account) -> AppResult<Account> {
        for attempt in 1..=TOKEN_ATTEMPTS {
            let token = generate_lending_token();
            match self
                .repository
                .accounts
                .replace_lending_token(account.id, &token)
                .await
            {
                Ok(Some(updated)) => {
                    tracing::info!(account_id = account.id, "Lending token regenerated");
                    return Ok(updated);
                }
                Ok(None) => return Err(Self::not_found(account.id)),
                Err(AppError::Conflict(_)) => {
                    tracing::warn!(account_id = account.id, attempt, "Lending token collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal(
            "Could not generate a unique lending token".to_string(),
        ))
    }

    /// Admin: list accounts, optionally only those awaiting approval
    pub async fn list(&self, admin: &Account, pending_only: bool) -> AppResult<Vec<AccountShort>> {
        admin.require_admin()?;
        let accounts = self.repository.accounts.list(pending_only).await?;
        Ok(accounts.into_iter().map(AccountShort::from).collect())
    }

    /// Admin: grant or withdraw dashboard access
    pub async fn set_approved(&self, admin: &Account, id: i64, approved: bool) -> AppResult<AccountShort> {
        admin.require_admin()?;
        let account = self
            .repository
            .accounts
            .set_approved(id, approved)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        tracing::info!(admin_id = admin.id, account_id = id, approved, "Account approval changed");
        Ok(account.into())
    }
}
