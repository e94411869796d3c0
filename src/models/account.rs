//! Account (lender) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// Privacy toggles for the public lending page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VisibilitySettings {
    /// Show which items are currently lent out
    pub show_borrowed_items: bool,
    /// Show who currently has an item (only effective with `show_borrowed_items`)
    pub show_borrower_name: bool,
    /// Show completed loans on item pages
    pub show_lending_history: bool,
    /// Show borrower names in the lending history
    pub show_history_borrower_names: bool,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            show_borrowed_items: true,
            show_borrower_name: false,
            show_lending_history: false,
            show_history_borrower_names: false,
        }
    }
}

/// Full account model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Account {
    pub id: i64,
    pub handle: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_approved: bool,
    pub is_admin: bool,
    /// Secret part of the public lending page URL
    pub lending_token: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub visibility: VisibilitySettings,
    #[serde(skip_serializing, default)]
    pub session_version: i32,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Approved accounts and administrators may use the dashboard
    pub fn can_use_dashboard(&self) -> bool {
        self.is_approved || self.is_admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator privileges required".to_string()))
        }
    }

    /// Path of the public lending page for this account
    pub fn lending_path(&self) -> String {
        format!("/api/v1/lend/{}", self.lending_token)
    }
}

/// Account row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub handle: String,
    pub password_hash: String,
    pub is_approved: bool,
    pub is_admin: bool,
    pub lending_token: String,
}

/// Short account representation for admin lists (no secrets)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountShort {
    pub id: i64,
    pub handle: String,
    pub is_approved: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountShort {
    fn from(account: Account) -> Self {
        AccountShort {
            id: account.id,
            handle: account.handle,
            is_approved: account.is_approved,
            is_admin: account.is_admin,
            created_at: account.created_at,
        }
    }
}

/// Self-registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterAccount {
    #[validate(length(min = 1, max = 150, message = "Handle must be 1 to 150 characters"))]
    pub handle: String,
    pub password: String,
    pub password_confirm: String,
}

/// Administrative provisioning request (account is pre-approved)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProvisionAccount {
    #[validate(length(min = 1, max = 150, message = "Handle must be 1 to 150 characters"))]
    pub handle: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Admin account list filter
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AccountQuery {
    /// Only list accounts awaiting approval
    pub pending: Option<bool>,
}

/// JWT claims for an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub account_id: i64,
    pub is_admin: bool,
    /// Must match `Account::session_version`; logout bumps it
    pub session_version: i32,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
