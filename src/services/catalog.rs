//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, CreateBook, Session, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add a book to the catalog; all copies start available.
    /// ISBN format is the presentation layer's concern, the catalog only
    /// requires the key to be non-empty and unique.
    pub async fn add_book(&self, session: &Session, book: CreateBook) -> AppResult<Book> {
        session.ensure_valid()?;

        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.repository.books.find_by_isbn(&book.isbn).await?.is_some() {
            return Err(AppError::Duplicate(format!(
                "A book with ISBN {} already exists",
                book.isbn
            )));
        }

        let created = self.repository.books.create(&book).await?;
        tracing::info!("Book '{}' ({}) added to the catalog", created.title, created.isbn);
        Ok(created)
    }

    /// Update a book; when `total_copies` changes, availability is
    /// recomputed so that copies already out on loan stay accounted for.
    pub async fn update_book(
        &self,
        session: &Session,
        isbn: &str,
        update: UpdateBook,
    ) -> AppResult<Book> {
        session.ensure_valid()?;

        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let existing = self.repository.books.get_by_isbn(isbn).await?;

        let copies = match update.total_copies {
            Some(new_total) => {
                let on_loan = existing.copies_on_loan();
                if new_total < on_loan {
                    return Err(AppError::Conflict(format!(
                        "{} copies of {} are out on loan, cannot reduce total to {}",
                        on_loan, isbn, new_total
                    )));
                }
                Some((new_total, new_total - on_loan))
            }
            None => None,
        };

        self.repository
            .books
            .update(
                isbn,
                update.title.as_deref(),
                update.author.as_deref(),
                copies,
            )
            .await
    }

    /// Delete a book. Refused while loan rows reference it: open loans must
    /// be returned first, and closed loans are kept as history.
    pub async fn delete_book(&self, session: &Session, isbn: &str) -> AppResult<()> {
        session.ensure_valid()?;

        self.repository.books.get_by_isbn(isbn).await?;

        let open = self.repository.loans.count_for_book(isbn, true).await?;
        if open > 0 {
            return Err(AppError::Conflict(format!(
                "Book {} has {} open loan(s)",
                isbn, open
            )));
        }

        let history = self.repository.loans.count_for_book(isbn, false).await?;
        if history > 0 {
            return Err(AppError::Conflict(format!(
                "Book {} is referenced by {} past loan(s)",
                isbn, history
            )));
        }

        self.repository.books.delete(isbn).await?;
        tracing::info!("Book {} deleted from the catalog", isbn);
        Ok(())
    }

    /// Case-insensitive substring search over title, author and ISBN.
    /// Re-queries storage on every call.
    pub async fn search_books(&self, query: &str) -> AppResult<Vec<Book>> {
        self.repository.books.search(query).await
    }

    pub async fn get_book(&self, isbn: &str) -> AppResult<Book> {
        self.repository.books.get_by_isbn(isbn).await
    }

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }
}
