//! Public visibility gate
//!
//! Turns a lender's privacy toggles plus raw records into what an anonymous
//! visitor of the lending page may see. Everything here is pure.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::models::{
    item::current_borrow, Borrow, BorrowStatus, Item, VisibilitySettings,
};

impl VisibilitySettings {
    /// Whether the "currently borrowed" badge is shown
    pub fn reveals_loan_state(&self) -> bool {
        self.show_borrowed_items
    }

    /// Whether the current borrower's name is shown. Needs the badge.
    pub fn reveals_current_borrower(&self) -> bool {
        self.show_borrowed_items && self.show_borrower_name
    }

    pub fn reveals_history(&self) -> bool {
        self.show_lending_history
    }

    /// Whether names are shown inside the history. Needs the history.
    pub fn reveals_history_borrowers(&self) -> bool {
        self.show_lending_history && self.show_history_borrower_names
    }
}

/// One catalog entry on the public lending page
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PublicItem {
    pub id: i64,
    pub title: String,
    pub short_description: Option<String>,
    pub image: Option<String>,
    pub borrow_time_limit: Option<String>,
    /// Whether the lender currently accepts requests for this item
    pub is_available: bool,
    /// Omitted when the lender hides loan state
    pub is_borrowed: Option<bool>,
    /// Omitted unless the lender shows borrower names
    pub borrower_name: Option<String>,
}

/// A completed loan on the public item page
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PublicHistoryEntry {
    pub borrower_name: Option<String>,
    pub lent_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
}

/// Public item detail page
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PublicItemDetail {
    #[serde(flatten)]
    pub item: PublicItem,
    pub long_description: Option<String>,
    /// Omitted when the lender hides lending history
    pub history: Option<Vec<PublicHistoryEntry>>,
}

/// Public lending page
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PublicCatalog {
    pub lender: String,
    pub items: Vec<PublicItem>,
}

/// Catalog entry for `item`, given the borrow currently holding it
pub fn catalog_entry(
    settings: &VisibilitySettings,
    item: &Item,
    current: Option<&Borrow>,
) -> PublicItem {
    PublicItem {
        id: item.id,
        title: item.title.clone(),
        short_description: item.short_description.clone(),
        image: item.image.clone(),
        borrow_time_limit: item.borrow_time_limit.clone(),
        is_available: item.is_available,
        is_borrowed: settings
            .reveals_loan_state()
            .then_some(current.is_some()),
        borrower_name: if settings.reveals_current_borrower() {
            current.map(|b| b.borrower_name.clone())
        } else {
            None
        },
    }
}

/// Completed loans (returned borrows), most recently returned first
pub fn history_entries(settings: &VisibilitySettings, borrows: &[Borrow]) -> Vec<PublicHistoryEntry> {
    let mut completed: Vec<&Borrow> = borrows
        .iter()
        .filter(|b| b.status == BorrowStatus::Returned)
        .collect();
    completed.sort_by(|a, b| b.returned_at.cmp(&a.returned_at));

    completed
        .into_iter()
        .map(|b| PublicHistoryEntry {
            borrower_name: settings
                .reveals_history_borrowers()
                .then(|| b.borrower_name.clone()),
            lent_at: b.lent_at,
            returned_at: b.returned_at,
        })
        .collect()
}

/// Detail page for `item` given all of its borrows
pub fn item_detail(settings: &VisibilitySettings, item: &Item, borrows: &[Borrow]) -> PublicItemDetail {
    PublicItemDetail {
        item: catalog_entry(settings, item, current_borrow(borrows)),
        long_description: item.long_description.clone(),
        history: settings
            .reveals_history()
            .then(|| history_entries(settings, borrows)),
    }
}
