//! Catalog management service (owner side)

use std::collections::HashMap;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        account::Account,
        borrow::{Borrow, BorrowStatus},
        item::{current_borrow, Item, ItemInput, OwnedItem},
    },
    repository::Repository,
};

use super::media::MediaStore;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    media: MediaStore,
}

impl CatalogService {
    pub fn new(repository: Repository, media: MediaStore) -> Self {
        Self { repository, media }
    }

    /// Fetch an item the account owns. Foreign items look missing.
    pub async fn owned_item(&self, owner: &Account, id: i64) -> AppResult<Item> {
        self.repository
            .items
            .get(id)
            .await?
            .filter(|item| item.is_owned_by(owner.id))
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// Owner's items with their derived loan state, newest first
    pub async fn list_items(&self, owner: &Account) -> AppResult<Vec<OwnedItem>> {
        let items = self.repository.items.list_by_owner(owner.id).await?;
        let mut lent: HashMap<i64, Borrow> = self
            .repository
            .borrows
            .list_for_owner(owner.id, &[BorrowStatus::LentOut])
            .await?
            .into_iter()
            .map(|record| (record.borrow.item_id, record.borrow))
            .collect();

        Ok(items
            .into_iter()
            .map(|item| {
                let current = lent.remove(&item.id);
                OwnedItem::new(item, current)
            })
            .collect())
    }

    pub async fn get_item(&self, owner: &Account, id: i64) -> AppResult<OwnedItem> {
        let item = self.owned_item(owner, id).await?;
        let borrows = self.repository.borrows.list_for_item(item.id).await?;
        let current = current_borrow(&borrows).cloned();
        Ok(OwnedItem::new(item, current))
    }

    pub async fn create_item(&self, owner: &Account, input: ItemInput) -> AppResult<Item> {
        let input = input.normalized();
        input.validate()?;

        let item = self.repository.items.create(owner.id, &input).await?;
        tracing::info!(account_id = owner.id, item_id = item.id, "Item created");
        Ok(item)
    }

    pub async fn update_item(&self, owner: &Account, id: i64, input: ItemInput) -> AppResult<Item> {
        let input = input.normalized();
        input.validate()?;

        let item = self.owned_item(owner, id).await?;
        self.repository
            .items
            .update(item.id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// Delete an item together with its borrow history and image
    pub async fn delete_item(&self, owner: &Account, id: i64) -> AppResult<()> {
        let item = self.owned_item(owner, id).await?;

        if !self.repository.items.delete(item.id).await? {
            return Err(AppError::NotFound(format!("Item with id {} not found", id)));
        }
        if let Some(image) = &item.image {
            self.media.remove(image).await;
        }

        tracing::info!(account_id = owner.id, item_id = id, "Item deleted");
        Ok(())
    }

    /// Flip the "accepting requests" switch. Loans in progress are untouched.
    pub async fn toggle_availability(&self, owner: &Account, id: i64) -> AppResult<Item> {
        let item = self.owned_item(owner, id).await?;
        let item = self
            .repository
            .items
            .toggle_availability(item.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))?;

        tracing::info!(item_id = id, is_available = item.is_available, "Item availability toggled");
        Ok(item)
    }

    /// Store a new image for the item, replacing any previous one
    pub async fn set_image(
        &self,
        owner: &Account,
        id: i64,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> AppResult<Item> {
        let item = self.owned_item(owner, id).await?;
        let extension = MediaStore::image_extension(file_name, content_type)?;
        let stored = self.media.save_image(&extension, bytes).await?;

        let updated = match self.repository.items.set_image(item.id, Some(stored.clone())).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.media.remove(&stored).await;
                return Err(AppError::NotFound(format!("Item with id {} not found", id)));
            }
            Err(e) => {
                self.media.remove(&stored).await;
                return Err(e);
            }
        };

        if let Some(previous) = &item.image {
            self.media.remove(previous).await;
        }
        Ok(updated)
    }

    pub async fn clear_image(&self, owner: &Account, id: i64) -> AppResult<Item> {
        let item = self.owned_item(owner, id).await?;
        let updated = self
            .repository
            .items
            .set_image(item.id, None)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))?;

        if let Some(previous) = &item.image {
            self.media.remove(previous).await;
        }
        Ok(updated)
    }
}
