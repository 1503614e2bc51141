//! Multi-user todo backend: registration, JWT login and per-user todo
//! CRUD over SQLite.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod repository;
pub mod route;
pub mod schema;

use sqlx::SqlitePool;
use tokio::sync::OnceCell;

use crate::{auth::TokenKeys, error::Result};

// Struct representing the application state
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: TokenKeys,
    pub password_cost: u32,
    // Verified against when the username is unknown, so that path costs
    // as much as a wrong password.
    pub(crate) dummy_hash: OnceCell<String>,
}

impl AppState {
    pub fn new(db: SqlitePool, tokens: TokenKeys) -> Self {
        AppState {
            db,
            tokens,
            password_cost: bcrypt::DEFAULT_COST,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Overrides the bcrypt work factor used for new password hashes.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub(crate) async fn dummy_hash(&self) -> Result<&str> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| {
                auth::hash_password("not-a-real-password".to_string(), self.password_cost)
            })
            .await?;
        Ok(hash.as_str())
    }
}
