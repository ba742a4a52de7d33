//! Book model and related request types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Book record, keyed by ISBN.
/// Invariant: `0 <= available_copies <= total_copies`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub total_copies: i64,
    pub available_copies: i64,
}

impl Book {
    /// Number of copies currently out on loan.
    pub fn copies_on_loan(&self) -> i64 {
        self.total_copies - self.available_copies
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: i64,
}

/// Update book request; only provided fields are changed
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: Option<String>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: Option<i64>,
}
