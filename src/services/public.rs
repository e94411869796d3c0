//! Public lending pages, reached through a lender's secret token

use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        account::Account,
        borrow::{Borrow, BorrowRequest, BorrowStatus},
        item::Item,
    },
    repository::Repository,
    visibility::{self, PublicCatalog, PublicItemDetail},
};

use super::borrows::BorrowsService;

#[derive(Clone)]
pub struct PublicService {
    repository: Repository,
    borrows: BorrowsService,
}

impl PublicService {
    pub fn new(repository: Repository, borrows: BorrowsService) -> Self {
        Self { repository, borrows }
    }

    /// Resolve a lending token. Unknown tokens and unapproved lenders look alike.
    async fn lender(&self, token: &str) -> AppResult<Account> {
        self.repository
            .accounts
            .get_by_lending_token(token)
            .await?
            .filter(Account::can_use_dashboard)
            .ok_or_else(|| AppError::NotFound("Lending page not found".to_string()))
    }

    async fn lender_item(&self, lender: &Account, item_id: i64) -> AppResult<Item> {
        self.repository
            .items
            .get(item_id)
            .await?
            .filter(|item| item.is_owned_by(lender.id))
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", item_id)))
    }

    /// The lender's whole catalog as a visitor sees it
    pub async fn catalog(&self, token: &str) -> AppResult<PublicCatalog> {
        let lender = self.lender(token).await?;
        let items = self.repository.items.list_by_owner(lender.id).await?;

        let lent: HashMap<i64, Borrow> = self
            .repository
            .borrows
            .list_for_owner(lender.id, &[BorrowStatus::LentOut])
            .await?
            .into_iter()
            .map(|record| (record.borrow.item_id, record.borrow))
            .collect();

        let items = items
            .iter()
            .map(|item| visibility::catalog_entry(&lender.visibility, item, lent.get(&item.id)))
            .collect();

        Ok(PublicCatalog {
            lender: lender.handle,
            items,
        })
    }

    /// One item's public page
    pub async fn item_detail(&self, token: &str, item_id: i64) -> AppResult<PublicItemDetail> {
        let lender = self.lender(token).await?;
        let item = self.lender_item(&lender, item_id).await?;
        let borrows = self.repository.borrows.list_for_item(item.id).await?;

        Ok(visibility::item_detail(&lender.visibility, &item, &borrows))
    }

    /// Ask to borrow an item
    pub async fn request_borrow(
        &self,
        token: &str,
        item_id: i64,
        request: BorrowRequest,
    ) -> AppResult<Borrow> {
        let lender = self.lender(token).await?;
        let item = self.lender_item(&lender, item_id).await?;
        self.borrows.request(&item, request).await
    }
}
