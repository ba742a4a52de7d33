//! Dashboard statistics service

use chrono::Utc;
use serde::Serialize;

use crate::{error::AppResult, repository::Repository};

/// Counters shown on the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_books: i64,
    pub available_copies: i64,
    pub total_members: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let now = Utc::now();

        Ok(DashboardStats {
            total_books: self.repository.books.count().await?,
            available_copies: self.repository.books.count_available_copies().await?,
            total_members: self.repository.members.count().await?,
            active_loans: self.repository.loans.count_active().await?,
            overdue_loans: self.repository.loans.count_overdue(now).await?,
        })
    }
}
