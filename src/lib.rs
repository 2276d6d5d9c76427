//! Stacks Library Circulation Tracker
//!
//! A small REST JSON server for library circulation: users authenticate,
//! browse the book catalog, check books out and return them; librarians
//! add titles and register users.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
