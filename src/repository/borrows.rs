//! Borrows repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::borrow::{Borrow, BorrowRecord, BorrowStatus, TransitionCommit},
};

use super::BorrowsStore;

const RECORD_SELECT: &str = r#"
    SELECT b.id, b.item_id, b.borrower_name, b.status, b.requested_at,
           b.approved_at, b.lent_at, b.returned_at,
           i.title AS item_title, i.owner_id
    FROM borrows b
    JOIN items i ON i.id = b.item_id
"#;

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowsStore for BorrowsRepository {
    async fn get(&self, id: i64) -> AppResult<Option<BorrowRecord>> {
        let record = sqlx::query_as::<_, BorrowRecord>(&format!("{} WHERE b.id = $1", RECORD_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn create_request(
        &self,
        item_id: i64,
        borrower_name: &str,
        requested_at: DateTime<Utc>,
    ) -> AppResult<Option<Borrow>> {
        // Conditional insert: availability is checked in the same statement
        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (item_id, borrower_name, status, requested_at)
            SELECT i.id, $2, $3, $4
            FROM items i
            WHERE i.id = $1 AND i.is_available
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(borrower_name)
        .bind(BorrowStatus::Requested)
        .bind(requested_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(borrow)
    }

    async fn list_for_item(&self, item_id: i64) -> AppResult<Vec<Borrow>> {
        let borrows = sqlx::query_as::<_, Borrow>(
            "SELECT * FROM borrows WHERE item_id = $1 ORDER BY requested_at DESC, id DESC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(borrows)
    }

    async fn list_for_owner(
        &self,
        owner_id: i64,
        statuses: &[BorrowStatus],
    ) -> AppResult<Vec<BorrowRecord>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let records = sqlx::query_as::<_, BorrowRecord>(&format!(
            "{} WHERE i.owner_id = $1 AND b.status = ANY($2) ORDER BY b.requested_at DESC, b.id DESC",
            RECORD_SELECT
        ))
        .bind(owner_id)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn commit_transition(
        &self,
        borrow: &Borrow,
        expected: BorrowStatus,
    ) -> AppResult<TransitionCommit> {
        let mut tx = self.pool.begin().await?;

        // Serializes every transition touching this item
        sqlx::query("SELECT id FROM items WHERE id = $1 FOR UPDATE")
            .bind(borrow.item_id)
            .execute(&mut *tx)
            .await?;

        if borrow.status == BorrowStatus::LentOut {
            let already_lent: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM borrows WHERE item_id = $1 AND status = $2 AND id != $3)",
            )
            .bind(borrow.item_id)
            .bind(BorrowStatus::LentOut)
            .bind(borrow.id)
            .fetch_one(&mut *tx)
            .await?;

            if already_lent {
                return Ok(TransitionCommit::ItemAlreadyLent);
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE borrows
            SET status = $2, approved_at = $3, lent_at = $4, returned_at = $5
            WHERE id = $1 AND status = $6
            "#,
        )
        .bind(borrow.id)
        .bind(borrow.status)
        .bind(borrow.approved_at)
        .bind(borrow.lent_at)
        .bind(borrow.returned_at)
        .bind(expected)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(TransitionCommit::StatusChanged);
        }

        tx.commit().await?;
        Ok(TransitionCommit::Applied)
    }
}
