//! Loans repository for database operations
//!
//! Checkout and return each run inside a single database transaction so the
//! book's availability flag and the loan row can never disagree. Both use
//! conditional updates: the availability check and the flip happen in one
//! statement, so two concurrent checkouts of the same book resolve to
//! exactly one open loan.

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{due_date_from, Loan},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get open loans for a user, oldest checkout first
    pub async fn open_for_user(&self, user_id: i32) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE user_id = $1 AND returned_date IS NULL
            ORDER BY checkout_date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Create a loan for a book, claiming its availability atomically.
    ///
    /// The update only succeeds while `available` is still true; losing the
    /// race to another checkout surfaces `Conflict` and nothing is written.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        loan_period_days: i64,
    ) -> AppResult<Loan> {
        let now = Utc::now();
        let due_date = due_date_from(now, loan_period_days);

        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE books SET available = FALSE WHERE id = $1 AND available",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            return Err(AppError::Conflict(
                "Book was checked out by another request".to_string(),
            ));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, checkout_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Close an open loan and release the book.
    ///
    /// The update is conditional on `returned_date IS NULL`, so a returned
    /// date can never be overwritten; a second return of the same loan fails
    /// with `NotFound`.
    pub async fn close(&self, loan_id: i32) -> AppResult<Loan> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET returned_date = $1
            WHERE id = $2 AND returned_date IS NULL
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No open loan with id {}", loan_id)))?;

        sqlx::query("UPDATE books SET available = TRUE WHERE id = $1")
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(loan)
    }
}
