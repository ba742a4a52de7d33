//! Repository layer for database operations

pub mod books;
pub mod loans;
pub mod members;
pub mod users;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::str::FromStr;

use crate::{config::DatabaseConfig, error::AppResult};

/// Embedded schema migrations, applied at startup and in tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Main repository struct holding the database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub users: users::UsersRepository,
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            members: members::MembersRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open the SQLite pool for the configured database and apply pending
    /// migrations. Foreign key enforcement is switched on for every
    /// connection.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| crate::error::AppError::Internal(format!("migration failed: {e}")))?;

        Ok(Self::new(pool))
    }
}
