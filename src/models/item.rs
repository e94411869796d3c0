//! Item model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::borrow::{Borrow, BorrowStatus};

/// Item model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    /// Stored image path, relative to the media root
    pub image: Option<String>,
    /// Freeform advice on how long the item can be kept. Never enforced.
    pub borrow_time_limit: Option<String>,
    /// Owner's "accepting requests" switch, independent of loan state
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_owned_by(&self, account_id: i64) -> bool {
        self.owner_id == account_id
    }
}

/// The borrow currently holding the item, if any.
///
/// Derived from the item's borrows rather than stored on the item.
pub fn current_borrow(borrows: &[Borrow]) -> Option<&Borrow> {
    borrows.iter().find(|b| b.status == BorrowStatus::LentOut)
}

/// Descriptive fields accepted on create and edit
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct ItemInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(max = 500, message = "Short description must be at most 500 characters"))]
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    #[validate(length(max = 100, message = "Borrow time limit must be at most 100 characters"))]
    pub borrow_time_limit: Option<String>,
}

impl ItemInput {
    /// Trim text fields and turn blank optional fields into `None`
    pub fn normalized(self) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        ItemInput {
            title: self.title.trim().to_string(),
            short_description: blank_to_none(self.short_description),
            long_description: blank_to_none(self.long_description),
            borrow_time_limit: blank_to_none(self.borrow_time_limit),
        }
    }
}

/// Owner's view of an item with its derived loan state
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnedItem {
    #[serde(flatten)]
    pub item: Item,
    pub is_currently_borrowed: bool,
    pub current_borrow: Option<Borrow>,
}

impl OwnedItem {
    pub fn new(item: Item, current_borrow: Option<Borrow>) -> Self {
        Self {
            item,
            is_currently_borrowed: current_borrow.is_some(),
            current_borrow,
        }
    }
}
