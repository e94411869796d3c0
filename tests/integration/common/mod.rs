//! Shared fixtures: an in-memory store and a ready-to-use application state

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lendshelf_server::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::{
        account::{Account, NewAccount, ProvisionAccount, VisibilitySettings},
        borrow::{Borrow, BorrowRecord, BorrowStatus, TransitionCommit},
        item::{Item, ItemInput},
    },
    repository::{AccountsStore, BorrowsStore, ItemsStore, Repository},
    AppState,
};

pub const PASSWORD: &str = "correct-horse-battery";

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    items: Vec<Item>,
    borrows: Vec<Borrow>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn record(&self, borrow: &Borrow) -> Option<BorrowRecord> {
        let item = self.items.iter().find(|i| i.id == borrow.item_id)?;
        Some(BorrowRecord {
            borrow: borrow.clone(),
            item_title: item.title.clone(),
            owner_id: item.owner_id,
        })
    }

    fn account_mut(&mut self, id: i64) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.id == id)
    }

    fn item_mut(&mut self, id: i64) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }
}

/// Store backed by plain vectors, with the same guarantees as the Postgres one
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("store mutex poisoned")
    }

    pub fn repository(&self) -> Repository {
        Repository::from_stores(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
        )
    }

    pub fn borrow_count(&self) -> usize {
        self.tables().borrows.len()
    }
}

#[async_trait]
impl AccountsStore for MemoryStore {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Account>> {
        Ok(self.tables().accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn get_by_handle(&self, handle: &str) -> AppResult<Option<Account>> {
        let handle = handle.to_lowercase();
        Ok(self
            .tables()
            .accounts
            .iter()
            .find(|a| a.handle.to_lowercase() == handle)
            .cloned())
    }

    async fn get_by_lending_token(&self, token: &str) -> AppResult<Option<Account>> {
        Ok(self
            .tables()
            .accounts
            .iter()
            .find(|a| a.lending_token == token)
            .cloned())
    }

    async fn list(&self, pending_only: bool) -> AppResult<Vec<Account>> {
        Ok(self
            .tables()
            .accounts
            .iter()
            .rev()
            .filter(|a| !pending_only || !a.is_approved)
            .cloned()
            .collect())
    }

    async fn create(&self, account: &NewAccount) -> AppResult<Account> {
        let mut tables = self.tables();
        let handle = account.handle.to_lowercase();
        if tables
            .accounts
            .iter()
            .any(|a| a.handle.to_lowercase() == handle || a.lending_token == account.lending_token)
        {
            return Err(AppError::Conflict("Account already exists".to_string()));
        }

        let created = Account {
            id: tables.next_id(),
            handle: account.handle.clone(),
            password_hash: account.password_hash.clone(),
            is_approved: account.is_approved,
            is_admin: account.is_admin,
            lending_token: account.lending_token.clone(),
            visibility: VisibilitySettings::default(),
            session_version: 0,
            created_at: Utc::now(),
        };
        tables.accounts.push(created.clone());
        Ok(created)
    }

    async fn set_approved(&self, id: i64, approved: bool) -> AppResult<Option<Account>> {
        Ok(self.tables().account_mut(id).map(|a| {
            a.is_approved = approved;
            a.clone()
        }))
    }

    async fn update_visibility(
        &self,
        id: i64,
        settings: &VisibilitySettings,
    ) -> AppResult<Option<Account>> {
        Ok(self.tables().account_mut(id).map(|a| {
            a.visibility = *settings;
            a.clone()
        }))
    }

    async fn replace_lending_token(&self, id: i64, token: &str) -> AppResult<Option<Account>> {
        let mut tables = self.tables();
        if tables
            .accounts
            .iter()
            .any(|a| a.id != id && a.lending_token == token)
        {
            return Err(AppError::Conflict("Lending token already in use".to_string()));
        }
        Ok(tables.account_mut(id).map(|a| {
            a.lending_token = token.to_string();
            a.clone()
        }))
    }

    async fn bump_session_version(&self, id: i64) -> AppResult<()> {
        if let Some(account) = self.tables().account_mut(id) {
            account.session_version += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl ItemsStore for MemoryStore {
    async fn get(&self, id: i64) -> AppResult<Option<Item>> {
        Ok(self.tables().items.iter().find(|i| i.id == id).cloned())
    }

    async fn list_by_owner(&self, owner_id: i64) -> AppResult<Vec<Item>> {
        Ok(self
            .tables()
            .items
            .iter()
            .rev()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create(&self, owner_id: i64, input: &ItemInput) -> AppResult<Item> {
        let mut tables = self.tables();
        let now = Utc::now();
        let item = Item {
            id: tables.next_id(),
            owner_id,
            title: input.title.clone(),
            short_description: input.short_description.clone(),
            long_description: input.long_description.clone(),
            image: None,
            borrow_time_limit: input.borrow_time_limit.clone(),
            is_available: true,
            created_at: now,
            updated_at: now,
        };
        tables.items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: i64, input: &ItemInput) -> AppResult<Option<Item>> {
        Ok(self.tables().item_mut(id).map(|item| {
            item.title = input.title.clone();
            item.short_description = input.short_description.clone();
            item.long_description = input.long_description.clone();
            item.borrow_time_limit = input.borrow_time_limit.clone();
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn toggle_availability(&self, id: i64) -> AppResult<Option<Item>> {
        Ok(self.tables().item_mut(id).map(|item| {
            item.is_available = !item.is_available;
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn set_image(&self, id: i64, image: Option<String>) -> AppResult<Option<Item>> {
        Ok(self.tables().item_mut(id).map(|item| {
            item.image = image;
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables();
        let before = tables.items.len();
        tables.items.retain(|i| i.id != id);
        tables.borrows.retain(|b| b.item_id != id);
        Ok(tables.items.len() != before)
    }
}

#[async_trait]
impl BorrowsStore for MemoryStore {
    async fn get(&self, id: i64) -> AppResult<Option<BorrowRecord>> {
        let tables = self.tables();
        Ok(tables
            .borrows
            .iter()
            .find(|b| b.id == id)
            .and_then(|b| tables.record(b)))
    }

    async fn create_request(
        &self,
        item_id: i64,
        borrower_name: &str,
        requested_at: DateTime<Utc>,
    ) -> AppResult<Option<Borrow>> {
        let mut tables = self.tables();
        if !tables.items.iter().any(|i| i.id == item_id && i.is_available) {
            return Ok(None);
        }

        let borrow = Borrow {
            id: tables.next_id(),
            item_id,
            borrower_name: borrower_name.to_string(),
            status: BorrowStatus::Requested,
            requested_at,
            approved_at: None,
            lent_at: None,
            returned_at: None,
        };
        tables.borrows.push(borrow.clone());
        Ok(Some(borrow))
    }

    async fn list_for_item(&self, item_id: i64) -> AppResult<Vec<Borrow>> {
        Ok(self
            .tables()
            .borrows
            .iter()
            .rev()
            .filter(|b| b.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn list_for_owner(
        &self,
        owner_id: i64,
        statuses: &[BorrowStatus],
    ) -> AppResult<Vec<BorrowRecord>> {
        let tables = self.tables();
        Ok(tables
            .borrows
            .iter()
            .rev()
            .filter(|b| statuses.contains(&b.status))
            .filter_map(|b| tables.record(b))
            .filter(|r| r.owner_id == owner_id)
            .collect())
    }

    async fn commit_transition(
        &self,
        borrow: &Borrow,
        expected: BorrowStatus,
    ) -> AppResult<TransitionCommit> {
        let mut tables = self.tables();

        if borrow.status == BorrowStatus::LentOut
            && tables.borrows.iter().any(|b| {
                b.item_id == borrow.item_id && b.id != borrow.id && b.status == BorrowStatus::LentOut
            })
        {
            return Ok(TransitionCommit::ItemAlreadyLent);
        }

        match tables
            .borrows
            .iter_mut()
            .find(|b| b.id == borrow.id && b.status == expected)
        {
            Some(stored) => {
                *stored = borrow.clone();
                Ok(TransitionCommit::Applied)
            }
            None => Ok(TransitionCommit::StatusChanged),
        }
    }
}

/// Application state over a fresh in-memory store
pub fn test_state() -> (AppState, MemoryStore) {
    let store = MemoryStore::default();
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.media.root = std::env::temp_dir()
        .join(format!("lendshelf-test-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    (AppState::new(config, store.repository()), store)
}

/// Create an approved lender and sign them in
pub async fn lender(state: &AppState, handle: &str) -> (Account, String) {
    state
        .services
        .auth
        .provision(ProvisionAccount {
            handle: handle.to_string(),
            password: PASSWORD.to_string(),
            is_admin: false,
        })
        .await
        .expect("provision lender");

    state
        .services
        .auth
        .authenticate(handle, PASSWORD)
        .await
        .map(|(token, account)| (account, token))
        .expect("sign in lender")
}

/// Create an administrator and sign them in
pub async fn admin(state: &AppState, handle: &str) -> (Account, String) {
    state
        .services
        .auth
        .provision(ProvisionAccount {
            handle: handle.to_string(),
            password: PASSWORD.to_string(),
            is_admin: true,
        })
        .await
        .expect("provision admin");

    state
        .services
        .auth
        .authenticate(handle, PASSWORD)
        .await
        .map(|(token, account)| (account, token))
        .expect("sign in admin")
}

pub fn item_input(title: &str) -> ItemInput {
    ItemInput {
        title: title.to_string(),
        short_description: Some(format!("A {}", title.to_lowercase())),
        long_description: None,
        borrow_time_limit: Some("two weeks".to_string()),
    }
}
