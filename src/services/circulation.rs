//! Circulation service: issuing and returning books

use chrono::{Duration, Utc};

use crate::{
    config::LoansConfig,
    error::AppResult,
    models::{Loan, LoanRecord, Session},
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    config: LoansConfig,
}

impl CirculationService {
    pub fn new(repository: Repository, config: LoansConfig) -> Self {
        Self { repository, config }
    }

    /// Issue a book to a member. The due date is the issue date plus the
    /// configured loan period.
    pub async fn issue_book(
        &self,
        session: &Session,
        isbn: &str,
        member_id: i64,
    ) -> AppResult<Loan> {
        session.ensure_valid()?;

        // Both must exist before availability is considered
        let book = self.repository.books.get_by_isbn(isbn).await?;
        let member = self.repository.members.get_by_id(member_id).await?;

        let loan = self
            .repository
            .loans
            .create(&book.isbn, member.id, Duration::days(self.config.loan_period_days))
            .await?;

        tracing::info!(
            "Issued '{}' ({}) to member {} ({}), due {}",
            book.title,
            book.isbn,
            member.name,
            member.id,
            loan.due_date.format("%Y-%m-%d")
        );

        Ok(loan)
    }

    /// Return a loaned copy. Reports whether the return happened after the
    /// due date.
    pub async fn return_book(&self, session: &Session, loan_id: i64) -> AppResult<(Loan, bool)> {
        session.ensure_valid()?;

        let loan = self.repository.loans.close(loan_id).await?;
        let overdue = loan.is_overdue_at(Utc::now());

        tracing::info!(
            "Loan {} returned ({}){}",
            loan.id,
            loan.book_isbn,
            if overdue { ", overdue" } else { "" }
        );

        Ok((loan, overdue))
    }

    /// Loan history of a member, newest first
    pub async fn loans_for_member(&self, member_id: i64) -> AppResult<Vec<LoanRecord>> {
        self.repository.members.get_by_id(member_id).await?;
        self.repository.loans.history_for_member(member_id).await
    }

    /// Loan history of a book, newest first
    pub async fn loans_for_book(&self, isbn: &str) -> AppResult<Vec<LoanRecord>> {
        self.repository.books.get_by_isbn(isbn).await?;
        self.repository.loans.history_for_book(isbn).await
    }

    /// Open loans currently past their due date
    pub async fn overdue_loans(&self) -> AppResult<Vec<LoanRecord>> {
        self.repository.loans.overdue(Utc::now()).await
    }
}
