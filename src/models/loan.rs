//! Loan (checkout record) model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan model from database
///
/// A loan is open while `returned_date` is NULL. At most one open loan may
/// exist per book at any time. `due_date` is informational: it is stored at
/// checkout and never enforced.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.returned_date.is_none()
    }
}

/// Compute the due date for a checkout starting at `checkout_date`
pub fn due_date_from(checkout_date: DateTime<Utc>, loan_period_days: i64) -> DateTime<Utc> {
    checkout_date + Duration::days(loan_period_days)
}
