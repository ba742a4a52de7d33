//! Librarium
//!
//! A single-user library management application: catalog, members and
//! circulation services over a local SQLite store, consumed by a thin
//! interactive console.

pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod validators;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
