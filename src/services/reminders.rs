//! Overdue reminder notices
//!
//! Formats one notice per overdue open loan. There is no mail transport in
//! a single-user desktop deployment; notices are shown at the console and
//! logged.

use chrono::{DateTime, Utc};

use crate::{error::AppResult, models::LoanRecord, repository::Repository};

/// A formatted overdue notice addressed to a member
#[derive(Debug, Clone)]
pub struct OverdueNotice {
    pub loan_id: i64,
    pub member_name: String,
    pub body: String,
}

#[derive(Clone)]
pub struct RemindersService {
    repository: Repository,
}

impl RemindersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Build notices for every open loan past its due date
    pub async fn overdue_notices(&self) -> AppResult<Vec<OverdueNotice>> {
        let now = Utc::now();
        let overdue = self.repository.loans.overdue(now).await?;

        let notices: Vec<OverdueNotice> = overdue
            .iter()
            .map(|loan| build_notice(loan, now))
            .collect();

        for notice in &notices {
            tracing::info!(
                "Overdue notice for loan {} (member '{}')",
                notice.loan_id,
                notice.member_name
            );
        }

        Ok(notices)
    }
}

fn build_notice(loan: &LoanRecord, now: DateTime<Utc>) -> OverdueNotice {
    let days_overdue = (now - loan.due_date).num_days();

    let body = format!(
        "Dear {},\n\n\
         This is a reminder that the following book is overdue:\n\n\
         Title: {}\n\
         Due Date: {}\n\
         Days Overdue: {}\n\n\
         Please return the book as soon as possible.",
        loan.member_name,
        loan.book_title,
        loan.due_date.format("%B %d, %Y"),
        days_overdue
    );

    OverdueNotice {
        loan_id: loan.id,
        member_name: loan.member_name.clone(),
        body,
    }
}
