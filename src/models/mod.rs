//! Data models for Librarium

pub mod book;
pub mod loan;
pub mod member;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use book::{Book, CreateBook, UpdateBook};
pub use loan::{Loan, LoanRecord};
pub use member::{CreateMember, Member, UpdateMember};
pub use session::Session;
pub use user::User;
