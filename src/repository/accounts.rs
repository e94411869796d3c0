//! Accounts repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::account::{Account, NewAccount, VisibilitySettings},
};

use super::AccountsStore;

const ACCOUNT_COLUMNS: &str = r#"
    id, handle, password_hash, is_approved, is_admin, lending_token,
    show_borrowed_items, show_borrower_name, show_lending_history,
    show_history_borrower_names, session_version, created_at
"#;

const LENDING_TOKEN_INDEX: &str = "accounts_lending_token_idx";

#[derive(Clone)]
pub struct AccountsRepository {
    pool: Pool<Postgres>,
}

impl AccountsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Map unique violations to a user-facing conflict
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        other => AppError::Database(other),
    }
}

#[async_trait]
impl AccountsStore for AccountsRepository {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn get_by_handle(&self, handle: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE LOWER(handle) = LOWER($1)",
            ACCOUNT_COLUMNS
        ))
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn get_by_lending_token(&self, token: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE lending_token = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn list(&self, pending_only: bool) -> AppResult<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE ($1 = FALSE OR is_approved = FALSE) ORDER BY created_at DESC",
            ACCOUNT_COLUMNS
        ))
        .bind(pending_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn create(&self, account: &NewAccount) -> AppResult<Account> {
        let defaults = VisibilitySettings::default();

        sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (
                handle, password_hash, is_approved, is_admin, lending_token,
                show_borrowed_items, show_borrower_name, show_lending_history,
                show_history_borrower_names
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(&account.handle)
        .bind(&account.password_hash)
        .bind(account.is_approved)
        .bind(account.is_admin)
        .bind(&account.lending_token)
        .bind(defaults.show_borrowed_items)
        .bind(defaults.show_borrower_name)
        .bind(defaults.show_lending_history)
        .bind(defaults.show_history_borrower_names)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let message = match &e {
                sqlx::Error::Database(db) if db.constraint() == Some(LENDING_TOKEN_INDEX) => {
                    "Lending token already in use"
                }
                _ => "An account with that handle already exists",
            };
            conflict_on_unique(e, message)
        })
    }

    async fn set_approved(&self, id: i64, approved: bool) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET is_approved = $2 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn update_visibility(
        &self,
        id: i64,
        settings: &VisibilitySettings,
    ) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts
            SET show_borrowed_items = $2, show_borrower_name = $3,
                show_lending_history = $4, show_history_borrower_names = $5
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(settings.show_borrowed_items)
        .bind(settings.show_borrower_name)
        .bind(settings.show_lending_history)
        .bind(settings.show_history_borrower_names)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn replace_lending_token(&self, id: i64, token: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET lending_token = $2 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Lending token already in use"))
    }

    async fn bump_session_version(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE accounts SET session_version = session_version + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
