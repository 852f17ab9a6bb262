use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::{Filter, FilterError};
use crate::types::ResourceType;

/// A stored row as a JSON object keyed by column name
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    pub fn first(limit: u64) -> Self {
        Self { offset: 0, limit }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub items: Vec<Value>,
    pub total: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate value for unique field '{0}'")]
    Duplicate(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Still referenced by '{0}'")]
    Referenced(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.constraint().unwrap_or("unknown").to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::Referenced(db.constraint().unwrap_or("unknown").to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err.to_string())
    }
}

/// Persistence seam for every resource
///
/// Scoped writes take the effective filter and apply it in the same statement that
/// changes the row, so a record outside the caller's scope is never touched.
#[async_trait]
pub trait Store: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ordered by `createdAt` desc, then `id` desc
    async fn list(&self, resource: ResourceType, filter: &Filter, window: Window) -> Result<Listing, StoreError>;

    async fn find_one(&self, resource: ResourceType, filter: &Filter) -> Result<Option<Value>, StoreError>;

    async fn count(&self, resource: ResourceType, filter: &Filter) -> Result<u64, StoreError>;

    /// Sum of a numeric column over matching rows; nulls count as 0
    async fn sum(&self, resource: ResourceType, filter: &Filter, column: &str) -> Result<f64, StoreError>;

    async fn insert(&self, resource: ResourceType, record: Record) -> Result<Value, StoreError>;

    /// Applies `changes` to the row matching `filter`; `None` when nothing matched
    async fn update(&self, resource: ResourceType, filter: &Filter, changes: Record) -> Result<Option<Value>, StoreError>;

    /// `false` when nothing matched
    async fn delete(&self, resource: ResourceType, filter: &Filter) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    async fn exists(&self, resource: ResourceType, filter: &Filter) -> Result<bool, StoreError> {
        Ok(self.count(resource, filter).await? > 0)
    }
}
