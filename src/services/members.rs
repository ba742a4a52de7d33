//! Membership management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{CreateMember, Member, Session, UpdateMember},
    repository::Repository,
    validators,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a new member. Email and phone must pass format validation
    /// before anything is written.
    pub async fn add_member(&self, session: &Session, member: CreateMember) -> AppResult<Member> {
        session.ensure_valid()?;

        member
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        check_formats(&member.email, &member.phone)?;

        if self.repository.members.email_exists(&member.email, None).await? {
            return Err(AppError::Duplicate(format!(
                "A member with email {} already exists",
                member.email
            )));
        }

        let created = self.repository.members.create(&member).await?;
        tracing::info!("Member '{}' registered with id {}", created.name, created.id);
        Ok(created)
    }

    /// Update a member; provided fields are validated the same way as on
    /// registration.
    pub async fn update_member(
        &self,
        session: &Session,
        id: i64,
        update: UpdateMember,
    ) -> AppResult<Member> {
        session.ensure_valid()?;

        update
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.repository.members.get_by_id(id).await?;

        if let Some(ref email) = update.email {
            if !validators::is_valid_email(email) {
                return Err(AppError::Validation("Invalid email format".to_string()));
            }
            if self.repository.members.email_exists(email, Some(id)).await? {
                return Err(AppError::Duplicate(format!(
                    "A member with email {} already exists",
                    email
                )));
            }
        }
        if let Some(ref phone) = update.phone {
            if !validators::is_valid_phone(phone) {
                return Err(AppError::Validation("Invalid phone format".to_string()));
            }
        }

        self.repository
            .members
            .update(
                id,
                update.name.as_deref(),
                update.email.as_deref(),
                update.phone.as_deref(),
            )
            .await
    }

    /// Remove a member. Refused while loan rows reference them: open loans
    /// must be returned first, and closed loans are kept as history.
    pub async fn delete_member(&self, session: &Session, id: i64) -> AppResult<()> {
        session.ensure_valid()?;

        self.repository.members.get_by_id(id).await?;

        let open = self.repository.loans.count_for_member(id, true).await?;
        if open > 0 {
            return Err(AppError::Conflict(format!(
                "Member {} has {} open loan(s)",
                id, open
            )));
        }

        let history = self.repository.loans.count_for_member(id, false).await?;
        if history > 0 {
            return Err(AppError::Conflict(format!(
                "Member {} is referenced by {} past loan(s)",
                id, history
            )));
        }

        self.repository.members.delete(id).await?;
        tracing::info!("Member {} deleted", id);
        Ok(())
    }

    /// Case-insensitive substring search over name and email
    pub async fn search_members(&self, query: &str) -> AppResult<Vec<Member>> {
        self.repository.members.search(query).await
    }

    pub async fn get_member(&self, id: i64) -> AppResult<Member> {
        self.repository.members.get_by_id(id).await
    }

    pub async fn list_members(&self) -> AppResult<Vec<Member>> {
        self.repository.members.list().await
    }
}

fn check_formats(email: &str, phone: &str) -> AppResult<()> {
    if !validators::is_valid_email(email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    if !validators::is_valid_phone(phone) {
        return Err(AppError::Validation("Invalid phone format".to_string()));
    }
    Ok(())
}
