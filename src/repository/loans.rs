//! Loans repository
//!
//! Issue and return touch two tables (the loan row and the book's
//! availability counter), so each runs inside a single SQL transaction.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::{Loan, LoanRecord},
};

const RECORD_SELECT: &str = r#"
    SELECT l.id, l.book_isbn, b.title AS book_title,
           l.member_id, m.name AS member_name,
           l.issue_date, l.due_date, l.returned_date
    FROM loans l
    JOIN books b ON l.book_isbn = b.isbn
    JOIN members m ON l.member_id = m.id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Sqlite>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Issue a copy: decrement availability and insert the open loan row.
    /// Fails with `Unavailable` when no copy is on the shelf; the caller is
    /// expected to have checked that book and member exist.
    pub async fn create(
        &self,
        isbn: &str,
        member_id: i64,
        loan_period: Duration,
    ) -> AppResult<Loan> {
        let now = Utc::now();
        let due_date = now + loan_period;

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies - 1
            WHERE isbn = ? AND available_copies > 0
            "#,
        )
        .bind(isbn)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Unavailable(isbn.to_string()));
        }

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO loans (book_isbn, member_id, issue_date, due_date)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(isbn)
        .bind(member_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Close an open loan: set the return date and put the copy back on the
    /// shelf. Fails with `AlreadyReturned` for a closed loan.
    pub async fn close(&self, loan_id: i64) -> AppResult<Loan> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = ?")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.returned_date.is_some() {
            return Err(AppError::AlreadyReturned(loan_id));
        }

        sqlx::query("UPDATE loans SET returned_date = ? WHERE id = ?")
            .bind(now)
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET available_copies = available_copies + 1 WHERE isbn = ?")
            .bind(&loan.book_isbn)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Loan {
            returned_date: Some(now),
            ..loan
        })
    }

    /// Full loan history for a member, newest first
    pub async fn history_for_member(&self, member_id: i64) -> AppResult<Vec<LoanRecord>> {
        let query = format!("{RECORD_SELECT} WHERE l.member_id = ? ORDER BY l.issue_date DESC");

        let loans = sqlx::query_as::<_, LoanRecord>(&query)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(loans)
    }

    /// Full loan history for a book, newest first
    pub async fn history_for_book(&self, isbn: &str) -> AppResult<Vec<LoanRecord>> {
        let query = format!("{RECORD_SELECT} WHERE l.book_isbn = ? ORDER BY l.issue_date DESC");

        let loans = sqlx::query_as::<_, LoanRecord>(&query)
            .bind(isbn)
            .fetch_all(&self.pool)
            .await?;

        Ok(loans)
    }

    /// Open loans past their due date at `now`, most overdue first
    pub async fn overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<LoanRecord>> {
        let query = format!(
            "{RECORD_SELECT} WHERE l.returned_date IS NULL AND l.due_date < ? ORDER BY l.due_date"
        );

        let loans = sqlx::query_as::<_, LoanRecord>(&query)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(loans)
    }

    /// Number of loan rows referencing a book; `open_only` restricts the
    /// count to loans not yet returned.
    pub async fn count_for_book(&self, isbn: &str, open_only: bool) -> AppResult<i64> {
        let query = if open_only {
            "SELECT COUNT(*) FROM loans WHERE book_isbn = ? AND returned_date IS NULL"
        } else {
            "SELECT COUNT(*) FROM loans WHERE book_isbn = ?"
        };

        let count: i64 = sqlx::query_scalar(query)
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of loan rows referencing a member; see [`Self::count_for_book`]
    pub async fn count_for_member(&self, member_id: i64, open_only: bool) -> AppResult<i64> {
        let query = if open_only {
            "SELECT COUNT(*) FROM loans WHERE member_id = ? AND returned_date IS NULL"
        } else {
            "SELECT COUNT(*) FROM loans WHERE member_id = ?"
        };

        let count: i64 = sqlx::query_scalar(query)
            .bind(member_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count open loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE returned_date IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count open loans past their due date at `now`
    pub async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE returned_date IS NULL AND due_date < ?",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
