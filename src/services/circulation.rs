//! Circulation service: checkout, return and catalog management
//!
//! Every operation takes the acting user's claims explicitly rather than
//! reading ambient session state, so authorization decisions stay local
//! and the service is callable from tests without a simulated request.

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook},
        loan::Loan,
        user::Claims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    config: CirculationConfig,
}

impl CirculationService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    /// List the full catalog, checked-out titles included
    pub async fn list_catalog(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Check a book out to the acting user.
    ///
    /// The availability flag is read first for a friendly error, but the
    /// authoritative check is the conditional update inside the loan
    /// insert: if another request claims the book between the read and the
    /// write, this one gets `Conflict` and no loan is created.
    pub async fn checkout(&self, book_id: i32, claims: &Claims) -> AppResult<Loan> {
        let book = self.repository.books.get_by_id(book_id).await?;

        if !book.available {
            return Err(AppError::Unavailable(format!(
                "\"{}\" is already checked out",
                book.title
            )));
        }

        let loan = self
            .repository
            .loans
            .create(claims.user_id, book.id, self.config.loan_period_days)
            .await?;

        tracing::info!(
            user_id = claims.user_id,
            book_id = book.id,
            loan_id = loan.id,
            "book checked out"
        );

        Ok(loan)
    }

    /// Return a loaned book.
    ///
    /// Only the borrowing user or a librarian may return a loan. A loan
    /// that is already closed reports `NotFound`; its returned date is
    /// never overwritten.
    pub async fn return_loan(&self, loan_id: i32, claims: &Claims) -> AppResult<Loan> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;

        claims.require_self_or_librarian(loan.user_id)?;

        let closed = self.repository.loans.close(loan.id).await?;

        tracing::info!(
            user_id = claims.user_id,
            book_id = closed.book_id,
            loan_id = closed.id,
            "book returned"
        );

        Ok(closed)
    }

    /// List a user's open loans; self or librarian only
    pub async fn open_loans_for(&self, user_id: i32, claims: &Claims) -> AppResult<Vec<Loan>> {
        claims.require_self_or_librarian(user_id)?;

        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.loans.open_for_user(user_id).await
    }

    /// Add a book to the catalog (librarian only)
    pub async fn add_book(&self, book: CreateBook, claims: &Claims) -> AppResult<Book> {
        claims.require_librarian()?;

        let created = self.repository.books.create(&book).await?;

        tracing::info!(book_id = created.id, title = %created.title, "book added to catalog");

        Ok(created)
    }
}
