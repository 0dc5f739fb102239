//! SQLite database store implementation.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Result as SqlResult, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::models::*;

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Not found")]
    NotFound,
    #[error("endpoint {0} already exists")]
    Duplicate(String),
    #[error("check interval must be positive, got {0}")]
    InvalidInterval(i64),
    #[error("database lock poisoned")]
    Poisoned,
}

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Open a throwaway in-memory store.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, DbError> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        store.init()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;
        Ok(())
    }

    // --- Endpoint CRUD ---

    /// Add a new endpoint and return its ID.
    pub fn add_endpoint(&self, endpoint: &mut EndpointConfig) -> Result<i64, DbError> {
        if endpoint.check_interval_secs == 0 {
            return Err(DbError::InvalidInterval(0));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO endpoints (url, check_interval) VALUES (?1, ?2)",
            params![endpoint.url, endpoint.check_interval_secs],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                DbError::Duplicate(endpoint.url.clone())
            }
            e => DbError::from(e),
        })?;
        let id = conn.last_insert_rowid();
        endpoint.id = id;
        Ok(id)
    }

    /// Get all endpoints, oldest first.
    pub fn get_endpoints(&self) -> Result<Vec<EndpointConfig>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, url, check_interval FROM endpoints ORDER BY id")?;

        let endpoints = stmt
            .query_map([], endpoint_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(endpoints)
    }

    /// Get an endpoint by ID.
    pub fn get_endpoint(&self, id: i64) -> Result<EndpointConfig, DbError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, url, check_interval FROM endpoints WHERE id = ?1",
            params![id],
            endpoint_from_row,
        )
        .optional()?
        .ok_or(DbError::NotFound)
    }

    /// Get an endpoint by URL.
    pub fn get_endpoint_by_url(&self, url: &str) -> Result<Option<EndpointConfig>, DbError> {
        let conn = self.conn()?;
        let endpoint = conn
            .query_row(
                "SELECT id, url, check_interval FROM endpoints WHERE url = ?1",
                params![url],
                endpoint_from_row,
            )
            .optional()?;
        Ok(endpoint)
    }

    /// Delete an endpoint by ID.
    pub fn delete_endpoint(&self, id: i64) -> Result<(), DbError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM endpoints WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Delete an endpoint by URL, returning whether one existed.
    pub fn delete_endpoint_by_url(&self, url: &str) -> Result<bool, DbError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM endpoints WHERE url = ?1", params![url])?;
        Ok(deleted > 0)
    }
}

fn endpoint_from_row(row: &Row<'_>) -> SqlResult<EndpointConfig> {
    Ok(EndpointConfig {
        id: row.get(0)?,
        url: row.get(1)?,
        check_interval_secs: row.get(2)?,
    })
}
