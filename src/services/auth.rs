//! Authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::time::Duration;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{session::CurrentUser, Session, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by username and password and hand out a session.
    /// Unknown user and wrong password produce the same message.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| {
                AppError::Authentication("Invalid username or password".to_string())
            })?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        tracing::info!("User {} logged in", user.username);

        Ok(Session::new(
            CurrentUser {
                id: user.id,
                username: user.username,
                role: user.role,
            },
            Duration::from_secs(self.config.session_timeout_secs),
        ))
    }

    /// End a session
    pub fn logout(&self, session: Session) {
        tracing::info!("User {} logged out", session.user().username);
        drop(session);
    }

    /// Change the logged-in user's password after verifying the current one
    pub async fn change_password(
        &self,
        session: &Session,
        current: &str,
        new: &str,
    ) -> AppResult<()> {
        session.ensure_valid()?;

        if new.len() < 4 {
            return Err(AppError::Validation(
                "Password must be at least 4 characters".to_string(),
            ));
        }

        let user = self.repository.users.get_by_id(session.user().id).await?;

        if !self.verify_password(&user, current)? {
            return Err(AppError::Authentication(
                "Current password is incorrect".to_string(),
            ));
        }

        let hash = self.hash_password(new)?;
        self.repository.users.update_password(user.id, &hash).await
    }

    /// Seed the administrator account on first startup
    pub async fn ensure_default_user(&self) -> AppResult<()> {
        let username = &self.config.default_admin_username;

        if self.repository.users.get_by_username(username).await?.is_none() {
            let hash = self.hash_password(&self.config.default_admin_password)?;
            self.repository.users.create(username, &hash, "admin").await?;
            tracing::info!("Default admin user '{}' created", username);
        }

        Ok(())
    }

    /// Verify a password against the stored Argon2 hash
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2; the salt ends up inside the PHC string
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
