//! Members repository

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::{CreateMember, Member},
};

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Sqlite>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Member> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Check if an email is already registered to another member
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM members WHERE LOWER(email) = LOWER(?) AND id != ?)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE LOWER(email) = LOWER(?))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    /// Create a new member
    pub async fn create(&self, member: &CreateMember) -> AppResult<Member> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO members (name, email, phone, joined_date)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Update member fields; `None` leaves a column unchanged
    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> AppResult<Member> {
        let mut sets = Vec::new();

        if name.is_some() {
            sets.push("name = ?");
        }
        if email.is_some() {
            sets.push("email = ?");
        }
        if phone.is_some() {
            sets.push("phone = ?");
        }

        if !sets.is_empty() {
            let query = format!("UPDATE members SET {} WHERE id = ?", sets.join(", "));

            let mut builder = sqlx::query(&query);
            if let Some(name) = name {
                builder = builder.bind(name);
            }
            if let Some(email) = email {
                builder = builder.bind(email);
            }
            if let Some(phone) = phone {
                builder = builder.bind(phone);
            }
            builder.bind(id).execute(&self.pool).await?;
        }

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Case-insensitive substring search over name and email
    pub async fn search(&self, query: &str) -> AppResult<Vec<Member>> {
        let pattern = format!("%{}%", query);

        let members = sqlx::query_as::<_, Member>(
            "SELECT * FROM members WHERE name LIKE ? OR email LIKE ? ORDER BY id DESC",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// All members, newest first (matches the original listing)
    pub async fn list(&self) -> AppResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(members)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
