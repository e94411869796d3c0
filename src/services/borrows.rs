//! Borrow workflow service
//!
//! Visitors create requests; only the owner of the item moves them along.
//! Every move is computed in memory by [`Borrow::apply`] and then committed
//! with a status-guarded write, so a stale or doubled click fails instead of
//! silently succeeding.

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        account::Account,
        borrow::{Borrow, BorrowAction, BorrowRecord, BorrowRequest, BorrowStatus, TransitionCommit},
        item::Item,
    },
    repository::Repository,
};

/// Open borrows per state, for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BorrowCounts {
    pub requested: usize,
    pub approved: usize,
    pub lent_out: usize,
}

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
}

impl BorrowsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Anonymous request to borrow `item`
    pub async fn request(&self, item: &Item, request: BorrowRequest) -> AppResult<Borrow> {
        let request = BorrowRequest {
            borrower_name: request.borrower_name.trim().to_string(),
        };
        request.validate()?;

        if !item.is_available {
            return Err(AppError::Validation(
                "This item is not available for borrowing right now".to_string(),
            ));
        }

        let borrow = self
            .repository
            .borrows
            .create_request(item.id, &request.borrower_name, Utc::now())
            .await?
            // availability flipped between the read and the insert
            .ok_or_else(|| {
                AppError::Validation("This item is not available for borrowing right now".to_string())
            })?;

        tracing::info!(item_id = item.id, borrow_id = borrow.id, "Borrow requested");
        Ok(borrow)
    }

    /// Fetch a borrow on one of the owner's items. Foreign borrows look missing.
    async fn owned_record(&self, owner: &Account, id: i64) -> AppResult<BorrowRecord> {
        self.repository
            .borrows
            .get(id)
            .await?
            .filter(|record| record.owner_id == owner.id)
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))
    }

    /// Apply an owner action to a borrow
    pub async fn transition(&self, owner: &Account, id: i64, action: BorrowAction) -> AppResult<BorrowRecord> {
        let record = self.owned_record(owner, id).await?;
        let expected = action.required_status();

        let mut borrow = record.borrow.clone();
        borrow.apply(action, Utc::now())?;

        match self
            .repository
            .borrows
            .commit_transition(&borrow, expected)
            .await?
        {
            TransitionCommit::Applied => {
                tracing::info!(
                    borrow_id = id,
                    item_id = borrow.item_id,
                    from = %expected,
                    to = %borrow.status,
                    "Borrow transitioned"
                );
                Ok(BorrowRecord { borrow, ..record })
            }
            TransitionCommit::StatusChanged => {
                tracing::warn!(borrow_id = id, ?action, "Borrow changed concurrently");
                Err(AppError::InvalidTransition(format!(
                    "Borrow {} was changed by another request; reload and try again",
                    id
                )))
            }
            TransitionCommit::ItemAlreadyLent => Err(AppError::InvalidTransition(format!(
                "\"{}\" is already lent out; mark it returned first",
                record.item_title
            ))),
        }
    }

    pub async fn approve(&self, owner: &Account, id: i64) -> AppResult<BorrowRecord> {
        self.transition(owner, id, BorrowAction::Approve).await
    }

    pub async fn deny(&self, owner: &Account, id: i64) -> AppResult<BorrowRecord> {
        self.transition(owner, id, BorrowAction::Deny).await
    }

    pub async fn mark_lent(&self, owner: &Account, id: i64) -> AppResult<BorrowRecord> {
        self.transition(owner, id, BorrowAction::MarkLent).await
    }

    pub async fn mark_returned(&self, owner: &Account, id: i64) -> AppResult<BorrowRecord> {
        self.transition(owner, id, BorrowAction::MarkReturned).await
    }

    /// Requests still waiting on the owner: new and approved-not-picked-up
    pub async fn open_requests(&self, owner: &Account) -> AppResult<Vec<BorrowRecord>> {
        self.repository
            .borrows
            .list_for_owner(owner.id, &[BorrowStatus::Requested, BorrowStatus::Approved])
            .await
    }

    /// Items currently out with friends
    pub async fn current_lendings(&self, owner: &Account) -> AppResult<Vec<BorrowRecord>> {
        self.repository
            .borrows
            .list_for_owner(owner.id, &[BorrowStatus::LentOut])
            .await
    }

    /// Every borrow of one owned item, in all states
    pub async fn item_history(&self, item: &Item) -> AppResult<Vec<Borrow>> {
        self.repository.borrows.list_for_item(item.id).await
    }

    pub async fn counts(&self, owner: &Account) -> AppResult<BorrowCounts> {
        let records = self
            .repository
            .borrows
            .list_for_owner(
                owner.id,
                &[BorrowStatus::Requested, BorrowStatus::Approved, BorrowStatus::LentOut],
            )
            .await?;

        let mut counts = BorrowCounts::default();
        for record in &records {
            match record.borrow.status {
                BorrowStatus::Requested => counts.requested += 1,
                BorrowStatus::Approved => counts.approved += 1,
                BorrowStatus::LentOut => counts.lent_out += 1,
                BorrowStatus::Denied | BorrowStatus::Returned => {}
            }
        }
        Ok(counts)
    }
}
