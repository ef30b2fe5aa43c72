//! Store Engine Contract
//!
//! The boundary between the repository layer and whatever holds the bytes.
//! Records are JSON documents queried through named secondary indexes, each
//! index pairing a partition key with a sort key. Pagination is cursor-based
//! and the cursor is owned entirely by the engine: callers thread it through
//! unchanged and never inspect it.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Field interpreted by the engine as an automatic-expiry instant
/// (RFC 3339). Rows whose expiry is in the past are invisible to reads.
pub const EXPIRE_AT_FIELD: &str = "dangerouslyExpireAt";

/// Ordered equality-filter map (insertion order preserved).
pub type FilterMap = IndexMap<String, Value>;

// ============================================================================
// Query Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A secondary index: a partition key paired with a sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub partition_key: String,
    pub sort_key: String,
}

impl IndexDefinition {
    /// Build an index definition with the conventional
    /// `<partition>_<sort>_index` name.
    pub fn by_convention(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        let partition_key = partition_key.into();
        let sort_key = sort_key.into();
        Self {
            name: format!("{}_{}_index", partition_key, sort_key),
            partition_key,
            sort_key,
        }
    }
}

/// A single indexed read, fully described.
#[derive(Debug, Clone)]
pub struct IndexQuery {
    pub table: String,
    pub index: IndexDefinition,
    pub partition_value: Value,
    /// Equality filters applied after the partition scan.
    pub filter: Option<FilterMap>,
    /// Range predicate on the index's sort key. Supported operators:
    /// `eq`, `gt`, `gte`, `lt`, `lte`, `between` ([lo, hi]), `beginsWith`.
    pub sort_key_query: Option<FilterMap>,
    /// Projection; `None` returns full rows.
    pub fields: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub sort: Option<SortDirection>,
}

/// Continuation input for a paginated read.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Opaque cursor from a previous page. `None` or empty means first page.
    pub next_page_hash: Option<String>,
    /// Upper bound on rows evaluated for one page.
    pub evaluation_limit: Option<u32>,
}

/// One page of results plus the continuation cursor, if any.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_hash: Option<String>,
}

/// A guard attached to a conditional write.
#[derive(Debug, Clone)]
pub enum Condition {
    Equals { field: String, value: Value },
}

impl Condition {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate record: {table} already holds id {id}")]
    Duplicate { table: String, id: String },

    #[error("Conditional check failed: {table}/{id}")]
    ConditionalCheckFailed { table: String, id: String },

    #[error("Malformed page cursor")]
    BadCursor,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {message}")]
    Internal { message: String },
}

impl StoreError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Engine Contract
// ============================================================================

/// The document-store engine consumed by the repository layer.
///
/// Implementations must enforce `id` uniqueness on insert, honor conditional
/// guards on update (failing outright, never merging), and treat
/// [`EXPIRE_AT_FIELD`] as an expiry marker on reads.
#[async_trait]
pub trait StoreEngine: Send + Sync {
    /// Insert a new record; the record must carry a string `id`.
    async fn create_one(&self, table: &str, record: Value) -> Result<Value>;

    /// Shallow-merge `patch` into the identified record after every
    /// condition holds. A missing row fails the conditional check.
    async fn update_one(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        conditions: &[Condition],
    ) -> Result<Value>;

    /// Remove a record; returns whether anything was deleted.
    async fn delete_one(&self, table: &str, id: &str) -> Result<bool>;

    async fn get_one_by_id(&self, table: &str, id: &str) -> Result<Option<Value>>;

    async fn get_many_by_ids(&self, table: &str, ids: &[String]) -> Result<Vec<Value>>;

    /// Indexed read: partition scan + sort-key range + equality filters.
    /// Returns an empty vec for "no results"; never errors on a miss.
    async fn get_many_by_index(&self, query: IndexQuery) -> Result<Vec<Value>>;

    /// Paginated variant of [`get_many_by_index`](Self::get_many_by_index).
    async fn get_many_by_index_paginate(
        &self,
        query: IndexQuery,
        page: PageRequest,
    ) -> Result<Page<Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_name_convention() {
        let idx = IndexDefinition::by_convention("featureEntity", "createdAtDate");
        assert_eq!(idx.name, "featureEntity_createdAtDate_index");
        assert_eq!(idx.partition_key, "featureEntity");
        assert_eq!(idx.sort_key, "createdAtDate");
    }
}
