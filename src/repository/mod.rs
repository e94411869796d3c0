//! Repository layer for database operations
//!
//! Services talk to storage through the store traits below, so tests can
//! swap the Postgres implementations for in-memory ones.

pub mod accounts;
pub mod borrows;
pub mod items;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        account::{Account, NewAccount, VisibilitySettings},
        borrow::{Borrow, BorrowRecord, BorrowStatus, TransitionCommit},
        item::{Item, ItemInput},
    },
};

/// Lender accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountsStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Account>>;

    /// Case-insensitive lookup
    async fn get_by_handle(&self, handle: &str) -> AppResult<Option<Account>>;

    async fn get_by_lending_token(&self, token: &str) -> AppResult<Option<Account>>;

    async fn list(&self, pending_only: bool) -> AppResult<Vec<Account>>;

    /// Fails with `AppError::Conflict` when the handle or token is taken
    async fn create(&self, account: &NewAccount) -> AppResult<Account>;

    async fn set_approved(&self, id: i64, approved: bool) -> AppResult<Option<Account>>;

    async fn update_visibility(
        &self,
        id: i64,
        settings: &VisibilitySettings,
    ) -> AppResult<Option<Account>>;

    /// Fails with `AppError::Conflict` when the token is already in use
    async fn replace_lending_token(&self, id: i64, token: &str) -> AppResult<Option<Account>>;

    /// Revoke every session issued so far
    async fn bump_session_version(&self, id: i64) -> AppResult<()>;
}

/// Catalog items
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemsStore: Send + Sync {
    async fn get(&self, id: i64) -> AppResult<Option<Item>>;

    /// Newest first
    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<Item>>;

    async fn create(&self, owner_id: i64, input: &ItemInput) -> AppResult<Item>;

    async fn update(&self, id: i64, input: &ItemInput) -> AppResult<Option<Item>>;

    /// Atomic flip of `is_available`
    async fn toggle_availability(&self, id: i64) -> AppResult<Option<Item>>;

    async fn set_image(&self, id: i64, image: Option<String>) -> AppResult<Option<Item>>;

    /// Deletes the item and, by cascade, its borrows
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

/// Borrow records and workflow commits
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowsStore: Send + Sync {
    async fn get(&self, id: i64) -> AppResult<Option<BorrowRecord>>;

    /// Insert a `requested` borrow if the item exists and is available.
    /// Returns `None` otherwise.
    async fn create_request(
        &self,
        item_id: i64,
        borrower_name: &str,
        requested_at: DateTime<Utc>,
    ) -> AppResult<Option<Borrow>>;

    /// All borrows of an item, newest request first
    async fn list_for_item(&self, item_id: i64) -> AppResult<Vec<Borrow>>;

    /// Borrows across an owner's items in the given states, newest request first
    async fn list_for_owner(
        &self,
        owner_id: i64,
        statuses: &[BorrowStatus],
    ) -> AppResult<Vec<BorrowRecord>>;

    /// Persist `borrow` (already moved in memory) if its stored status is
    /// still `expected`.
    ///
    /// Runs atomically with respect to other commits on the same item, and
    /// refuses to store a second `lent_out` borrow for one item.
    async fn commit_transition(
        &self,
        borrow: &Borrow,
        expected: BorrowStatus,
    ) -> AppResult<TransitionCommit>;
}

/// Main repository struct holding the stores
#[derive(Clone)]
pub struct Repository {
    pub accounts: Arc<dyn AccountsStore>,
    pub items: Arc<dyn ItemsStore>,
    pub borrows: Arc<dyn BorrowsStore>,
    /// Present when backed by Postgres; used for readiness checks
    pub pool: Option<Pool<Postgres>>,
}

impl Repository {
    /// Create a Postgres-backed repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            accounts: Arc::new(accounts::AccountsRepository::new(pool.clone())),
            items: Arc::new(items::ItemsRepository::new(pool.clone())),
            borrows: Arc::new(borrows::BorrowsRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Assemble a repository from arbitrary store implementations
    pub fn from_stores(
        accounts: Arc<dyn AccountsStore>,
        items: Arc<dyn ItemsStore>,
        borrows: Arc<dyn BorrowsStore>,
    ) -> Self {
        Self {
            accounts,
            items,
            borrows,
            pool: None,
        }
    }

    /// Check that the backing database answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
