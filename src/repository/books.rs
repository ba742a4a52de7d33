//! Books repository for catalog operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::{Book, CreateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get book by ISBN
    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Book> {
        self.find_by_isbn(isbn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = ?")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Insert a new book; all copies start available
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        sqlx::query(
            r#"
            INSERT INTO books (isbn, title, author, total_copies, available_copies)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.total_copies)
        .bind(book.total_copies)
        .execute(&self.pool)
        .await?;

        self.get_by_isbn(&book.isbn).await
    }

    /// Update book fields; `None` leaves a column unchanged
    pub async fn update(
        &self,
        isbn: &str,
        title: Option<&str>,
        author: Option<&str>,
        copies: Option<(i64, i64)>, // (total, available)
    ) -> AppResult<Book> {
        let mut sets = Vec::new();

        if title.is_some() {
            sets.push("title = ?");
        }
        if author.is_some() {
            sets.push("author = ?");
        }
        if copies.is_some() {
            sets.push("total_copies = ?");
            sets.push("available_copies = ?");
        }

        if !sets.is_empty() {
            let query = format!("UPDATE books SET {} WHERE isbn = ?", sets.join(", "));

            let mut builder = sqlx::query(&query);
            if let Some(title) = title {
                builder = builder.bind(title);
            }
            if let Some(author) = author {
                builder = builder.bind(author);
            }
            if let Some((total, available)) = copies {
                builder = builder.bind(total).bind(available);
            }
            builder.bind(isbn).execute(&self.pool).await?;
        }

        self.get_by_isbn(isbn).await
    }

    pub async fn delete(&self, isbn: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Case-insensitive substring search over title, author and ISBN
    pub async fn search(&self, query: &str) -> AppResult<Vec<Book>> {
        let pattern = format!("%{}%", query);

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE title LIKE ? OR author LIKE ? OR isbn LIKE ?
            ORDER BY title
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY title")
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Count distinct titles
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sum of copies currently on the shelves
    pub async fn count_available_copies(&self) -> AppResult<i64> {
        let count: Option<i64> = sqlx::query_scalar("SELECT SUM(available_copies) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.unwrap_or(0))
    }
}
