//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Loan row. A loan is open while `returned_date` is NULL; rows are never
/// deleted and form the loan history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i64,
    pub book_isbn: String,
    pub member_id: i64,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.returned_date.is_none()
    }

    /// Whether the loan was (or is) past its due date: for a closed loan
    /// this compares the return date, for an open one the given instant.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.returned_date.unwrap_or(now) > self.due_date
    }
}

/// Loan joined with book title and member name, for history listings and
/// overdue notices.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoanRecord {
    pub id: i64,
    pub book_isbn: String,
    pub book_title: String,
    pub member_id: i64,
    pub member_name: String,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
}
