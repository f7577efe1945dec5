//! Article repository for SQLite persistence.
//!
//! This module is split into submodules for maintainability:
//! - `schema`: Database schema initialization
//! - `crud`: Basic create, read, update, delete operations
//! - `helpers`: Shared parsing utilities

mod crud;
mod helpers;
mod schema;

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::Result;

pub use helpers::ArticleFilter;

/// SQLite-backed article repository.
pub struct ArticleRepository {
    pub(crate) db_path: PathBuf,
}

impl ArticleRepository {
    /// Create a new article repository.
    pub fn new(db_path: &Path) -> Result<Self> {
        let repo = Self {
            db_path: db_path.to_path_buf(),
        };
        repo.init_schema()?;
        Ok(repo)
    }

    pub(crate) fn connect(&self) -> Result<Connection> {
        super::connect(&self.db_path)
    }

    /// Get the database path.
    pub fn database_path(&self) -> &Path {
        &self.db_path
    }
}
