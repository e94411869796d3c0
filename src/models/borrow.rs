//! Borrow model and the request/lend workflow state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Lifecycle state of a borrow
///
/// ```text
/// requested --approve--> approved --mark_lent--> lent_out --mark_returned--> returned
///     \--deny--> denied
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BorrowStatus {
    Requested,
    Approved,
    Denied,
    LentOut,
    Returned,
}

impl BorrowStatus {
    pub const ALL: [BorrowStatus; 5] = [
        BorrowStatus::Requested,
        BorrowStatus::Approved,
        BorrowStatus::Denied,
        BorrowStatus::LentOut,
        BorrowStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Requested => "requested",
            BorrowStatus::Approved => "approved",
            BorrowStatus::Denied => "denied",
            BorrowStatus::LentOut => "lent_out",
            BorrowStatus::Returned => "returned",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            BorrowStatus::Requested => "Requested",
            BorrowStatus::Approved => "Approved (Pending Pickup)",
            BorrowStatus::Denied => "Denied",
            BorrowStatus::LentOut => "Lent Out",
            BorrowStatus::Returned => "Returned",
        }
    }

    /// State reached by applying `action`, or `None` if the move is illegal
    pub fn next(self, action: BorrowAction) -> Option<BorrowStatus> {
        match (self, action) {
            (BorrowStatus::Requested, BorrowAction::Approve) => Some(BorrowStatus::Approved),
            (BorrowStatus::Requested, BorrowAction::Deny) => Some(BorrowStatus::Denied),
            (BorrowStatus::Approved, BorrowAction::MarkLent) => Some(BorrowStatus::LentOut),
            (BorrowStatus::LentOut, BorrowAction::MarkReturned) => Some(BorrowStatus::Returned),
            _ => None,
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(BorrowStatus::Requested),
            "approved" => Ok(BorrowStatus::Approved),
            "denied" => Ok(BorrowStatus::Denied),
            "lent_out" => Ok(BorrowStatus::LentOut),
            "returned" => Ok(BorrowStatus::Returned),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

// Stored as TEXT (guarded by a CHECK constraint)
impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: &str = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Owner-triggered workflow moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowAction {
    Approve,
    Deny,
    MarkLent,
    MarkReturned,
}

impl BorrowAction {
    /// The only state this action may be applied from
    pub fn required_status(&self) -> BorrowStatus {
        match self {
            BorrowAction::Approve | BorrowAction::Deny => BorrowStatus::Requested,
            BorrowAction::MarkLent => BorrowStatus::Approved,
            BorrowAction::MarkReturned => BorrowStatus::LentOut,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            BorrowAction::Approve => "approve",
            BorrowAction::Deny => "deny",
            BorrowAction::MarkLent => "mark as lent",
            BorrowAction::MarkReturned => "mark as returned",
        }
    }
}

/// Borrow model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i64,
    pub item_id: i64,
    pub borrower_name: String,
    pub status: BorrowStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub lent_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Borrow {
    /// Apply a workflow move in memory.
    ///
    /// On error the borrow is left untouched. Each timestamp is written only
    /// the first time its state is entered.
    pub fn apply(&mut self, action: BorrowAction, now: DateTime<Utc>) -> AppResult<()> {
        let next = self.status.next(action).ok_or_else(|| {
            AppError::InvalidTransition(format!(
                "Cannot {} a borrow that is {}",
                action.verb(),
                self.status.label().to_lowercase()
            ))
        })?;

        match next {
            BorrowStatus::Approved => {
                self.approved_at.get_or_insert(now);
            }
            BorrowStatus::LentOut => {
                self.lent_at.get_or_insert(now);
            }
            BorrowStatus::Returned => {
                self.returned_at.get_or_insert(now);
            }
            BorrowStatus::Requested | BorrowStatus::Denied => {}
        }
        self.status = next;
        Ok(())
    }
}

/// Borrow joined with the item it targets
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub borrow: Borrow,
    pub item_title: String,
    #[serde(skip)]
    pub owner_id: i64,
}

/// Anonymous borrow request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BorrowRequest {
    /// Name the lender will know the borrower by
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub borrower_name: String,
}

/// Outcome of committing a transition against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCommit {
    Applied,
    /// Someone else moved the borrow first
    StatusChanged,
    /// Another borrow of the same item is already lent out
    ItemAlreadyLent,
}
