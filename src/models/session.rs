//! In-process login session
//!
//! Replaces a global "logged in" flag: a [`Session`] is handed out by the
//! auth service and passed explicitly to every service call that mutates
//! the store.

use std::time::{Duration, Instant};

use crate::error::{AppError, AppResult};

/// Identity of the logged-in user, carried by the session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

/// Successful login for the process lifetime, subject to an idle timeout.
#[derive(Debug)]
pub struct Session {
    user: CurrentUser,
    started_at: Instant,
    timeout: Duration,
}

impl Session {
    pub fn new(user: CurrentUser, timeout: Duration) -> Self {
        Self {
            user,
            started_at: Instant::now(),
            timeout,
        }
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Whether the session is still within its timeout window.
    pub fn is_valid(&self) -> bool {
        self.started_at.elapsed() < self.timeout
    }

    /// Reset the timeout window, e.g. after user activity.
    pub fn refresh(&mut self) {
        self.started_at = Instant::now();
    }

    pub fn ensure_valid(&self) -> AppResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(AppError::Authentication(
                "Session expired, please log in again".to_string(),
            ))
        }
    }
}
