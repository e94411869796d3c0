//! Data models for Lendshelf

pub mod account;
pub mod borrow;
pub mod item;

// Re-export commonly used types
pub use account::{Account, VisibilitySettings};
pub use borrow::{Borrow, BorrowAction, BorrowRecord, BorrowStatus};
pub use item::{Item, ItemInput, OwnedItem};
