//! In-Memory Store Engine
//!
//! Reference engine backing tests and the local server mode. Tables are
//! plain maps guarded by a read-write lock; indexed reads are partition
//! scans evaluated against the index definition carried by each query.
//! Expiry ([`EXPIRE_AT_FIELD`](crate::EXPIRE_AT_FIELD)) is enforced on
//! every read path, matching the contract of the production engine.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    Condition, FilterMap, IndexQuery, Page, PageRequest, Result, SortDirection, StoreEngine,
    StoreError, EXPIRE_AT_FIELD,
};

/// In-process store engine.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

/// Internal cursor state. Opaque above this module.
#[derive(Serialize, Deserialize)]
struct CursorState {
    offset: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_id(record: &Value) -> Result<String> {
        record
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::internal("record is missing a string id"))
    }

    fn is_expired(row: &Value, now: &DateTime<Utc>) -> bool {
        row.get(EXPIRE_AT_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|expire| expire.with_timezone(&Utc) <= *now)
            .unwrap_or(false)
    }

    fn cmp_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            _ => None,
        }
    }

    fn matches_sort_key(row_value: Option<&Value>, ops: &FilterMap) -> bool {
        let Some(value) = row_value else {
            return false;
        };
        ops.iter().all(|(op, operand)| match op.as_str() {
            "eq" => value == operand,
            "gt" => matches!(Self::cmp_values(value, operand), Some(Ordering::Greater)),
            "gte" => matches!(
                Self::cmp_values(value, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            "lt" => matches!(Self::cmp_values(value, operand), Some(Ordering::Less)),
            "lte" => matches!(
                Self::cmp_values(value, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            "between" => match operand.as_array() {
                Some(bounds) if bounds.len() == 2 => {
                    matches!(
                        Self::cmp_values(value, &bounds[0]),
                        Some(Ordering::Greater | Ordering::Equal)
                    ) && matches!(
                        Self::cmp_values(value, &bounds[1]),
                        Some(Ordering::Less | Ordering::Equal)
                    )
                }
                _ => false,
            },
            "beginsWith" => match (value.as_str(), operand.as_str()) {
                (Some(v), Some(prefix)) => v.starts_with(prefix),
                _ => false,
            },
            _ => false,
        })
    }

    fn matches_filter(row: &Value, filter: Option<&FilterMap>) -> bool {
        match filter {
            None => true,
            Some(filter) => filter
                .iter()
                .all(|(field, expected)| row.get(field) == Some(expected)),
        }
    }

    fn project(row: &Value, fields: Option<&Vec<String>>) -> Value {
        match fields {
            None => row.clone(),
            Some(fields) => {
                let mut out = serde_json::Map::new();
                for field in fields {
                    if let Some(value) = row.get(field) {
                        out.insert(field.clone(), value.clone());
                    }
                }
                Value::Object(out)
            }
        }
    }

    /// Evaluate a query against the table: partition scan, sort-key range,
    /// equality filters, then ordering. Limit and projection are applied by
    /// the callers.
    fn evaluate(&self, query: &IndexQuery) -> Vec<Value> {
        let now = Utc::now();
        let tables = self.tables.read();
        let Some(table) = tables.get(&query.table) else {
            return Vec::new();
        };

        let mut rows: Vec<Value> = table
            .values()
            .filter(|row| !Self::is_expired(row, &now))
            .filter(|row| row.get(&query.index.partition_key) == Some(&query.partition_value))
            .filter(|row| match &query.sort_key_query {
                None => true,
                Some(ops) => Self::matches_sort_key(row.get(&query.index.sort_key), ops),
            })
            .filter(|row| Self::matches_filter(row, query.filter.as_ref()))
            .cloned()
            .collect();

        let sort_key = query.index.sort_key.clone();
        rows.sort_by(|a, b| {
            let ordering = match (a.get(&sort_key), b.get(&sort_key)) {
                (Some(x), Some(y)) => Self::cmp_values(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            // Stable tie-break on id so pagination never straddles equal keys
            // unpredictably.
            ordering.then_with(|| {
                let ai = a.get("id").and_then(Value::as_str).unwrap_or_default();
                let bi = b.get("id").and_then(Value::as_str).unwrap_or_default();
                ai.cmp(bi)
            })
        });

        if query.sort == Some(SortDirection::Desc) {
            rows.reverse();
        }
        rows
    }

    fn decode_cursor(hash: Option<&String>) -> Result<usize> {
        match hash.map(String::as_str) {
            None | Some("") => Ok(0),
            Some(encoded) => {
                let bytes = BASE64.decode(encoded).map_err(|_| StoreError::BadCursor)?;
                let state: CursorState =
                    serde_json::from_slice(&bytes).map_err(|_| StoreError::BadCursor)?;
                Ok(state.offset)
            }
        }
    }

    fn encode_cursor(offset: usize) -> String {
        let state = CursorState { offset };
        BASE64.encode(serde_json::to_vec(&state).unwrap_or_default())
    }

    fn check_conditions(table: &str, id: &str, row: &Value, conditions: &[Condition]) -> Result<()> {
        for condition in conditions {
            match condition {
                Condition::Equals { field, value } => {
                    if row.get(field) != Some(value) {
                        return Err(StoreError::ConditionalCheckFailed {
                            table: table.to_string(),
                            id: id.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StoreEngine for MemoryStore {
    async fn create_one(&self, table: &str, record: Value) -> Result<Value> {
        let id = Self::record_id(&record)?;
        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();
        if rows.contains_key(&id) {
            return Err(StoreError::Duplicate {
                table: table.to_string(),
                id,
            });
        }
        debug!(table, id = %id, "memory store insert");
        rows.insert(id, record.clone());
        Ok(record)
    }

    async fn update_one(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        conditions: &[Condition],
    ) -> Result<Value> {
        let patch = patch.as_object().cloned().ok_or_else(|| {
            StoreError::internal("update patch must be a JSON object")
        })?;

        let now = Utc::now();
        let mut tables = self.tables.write();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(id))
            .filter(|row| !Self::is_expired(row, &now))
            .ok_or_else(|| StoreError::ConditionalCheckFailed {
                table: table.to_string(),
                id: id.to_string(),
            })?;

        Self::check_conditions(table, id, row, conditions)?;

        if let Some(target) = row.as_object_mut() {
            for (field, value) in patch {
                target.insert(field, value);
            }
        }
        Ok(row.clone())
    }

    async fn delete_one(&self, table: &str, id: &str) -> Result<bool> {
        let mut tables = self.tables.write();
        Ok(tables
            .get_mut(table)
            .and_then(|rows| rows.remove(id))
            .is_some())
    }

    async fn get_one_by_id(&self, table: &str, id: &str) -> Result<Option<Value>> {
        let now = Utc::now();
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .and_then(|rows| rows.get(id))
            .filter(|row| !Self::is_expired(row, &now))
            .cloned())
    }

    async fn get_many_by_ids(&self, table: &str, ids: &[String]) -> Result<Vec<Value>> {
        let now = Utc::now();
        let tables = self.tables.read();
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| rows.get(id))
            .filter(|row| !Self::is_expired(row, &now))
            .cloned()
            .collect())
    }

    async fn get_many_by_index(&self, query: IndexQuery) -> Result<Vec<Value>> {
        let mut rows = self.evaluate(&query);
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows
            .iter()
            .map(|row| Self::project(row, query.fields.as_ref()))
            .collect())
    }

    async fn get_many_by_index_paginate(
        &self,
        query: IndexQuery,
        page: PageRequest,
    ) -> Result<Page<Value>> {
        let rows = self.evaluate(&query);
        let offset = Self::decode_cursor(page.next_page_hash.as_ref())?;

        let page_size = query
            .limit
            .or(page.evaluation_limit)
            .map(|n| n as usize)
            .unwrap_or(rows.len());

        let end = (offset + page_size).min(rows.len());
        let items = rows[offset.min(rows.len())..end]
            .iter()
            .map(|row| Self::project(row, query.fields.as_ref()))
            .collect();

        let next_page_hash = (end < rows.len()).then(|| Self::encode_cursor(end));
        Ok(Page {
            items,
            next_page_hash,
        })
    }
}
