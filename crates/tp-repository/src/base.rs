//! Base Repository
//!
//! Generic CRUD + indexed-query operations over the feature-entity
//! partitioning convention, independent of tenancy. Every entity kind gets
//! the same five standard secondary indexes, which make "list rows of entity
//! X by creation or record date" and "list rows under target Y" indexed
//! operations instead of scans.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use tp_common::SessionUser;
use tp_store::{
    Condition, FilterMap, IndexDefinition, IndexQuery, Page, PageRequest, SortDirection,
    StoreEngine, StoreError,
};

use crate::error::{RepoError, Result};
use crate::model::{fields, ModelDef};

// ============================================================================
// Read Parameters
// ============================================================================

/// Sort-key range predicate for a list read. The named field selects the
/// index; the predicate map is handed to the engine as the range condition.
#[derive(Debug, Clone)]
pub struct SortKeyParams {
    pub field_name: String,
    pub query: FilterMap,
}

impl SortKeyParams {
    pub fn new(field_name: impl Into<String>, query: FilterMap) -> Self {
        Self {
            field_name: field_name.into(),
            query,
        }
    }
}

/// Projection choice for a read. Lite fields are the default everywhere;
/// callers opt into full rows explicitly.
#[derive(Debug, Clone, Default)]
pub enum FieldSelection {
    #[default]
    Lite,
    All,
    Explicit(Vec<String>),
}

/// Parameters for an indexed list read.
#[derive(Debug, Clone, Default)]
pub struct WhereParams {
    pub query: Option<FilterMap>,
    pub fields: FieldSelection,
    pub limit: Option<u32>,
    pub sort: Option<SortDirection>,
    pub sort_key: Option<SortKeyParams>,
}

// ============================================================================
// Repository
// ============================================================================

pub struct BaseRepository<T> {
    store: Arc<dyn StoreEngine>,
    model: Arc<ModelDef>,
    entity_created_index: IndexDefinition,
    entity_record_index: IndexDefinition,
    target_feature_index: IndexDefinition,
    target_created_index: IndexDefinition,
    target_record_index: IndexDefinition,
    extra_indexes: Vec<IndexDefinition>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> BaseRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn StoreEngine>, model: Arc<ModelDef>) -> Self {
        Self {
            store,
            model,
            entity_created_index: IndexDefinition::by_convention(
                fields::FEATURE_ENTITY,
                fields::CREATED_AT_DATE,
            ),
            entity_record_index: IndexDefinition::by_convention(
                fields::FEATURE_ENTITY,
                fields::RECORD_DATE,
            ),
            target_feature_index: IndexDefinition::by_convention(
                fields::TARGET_ID,
                fields::FEATURE_ENTITY,
            ),
            target_created_index: IndexDefinition::by_convention(
                fields::TARGET_ID,
                fields::CREATED_AT_DATE,
            ),
            target_record_index: IndexDefinition::by_convention(
                fields::TARGET_ID,
                fields::RECORD_DATE,
            ),
            extra_indexes: Vec::new(),
            _entity: PhantomData,
        }
    }

    /// Register entity-specific indexes on top of the standard set.
    pub fn with_extra_indexes(mut self, extra: Vec<IndexDefinition>) -> Self {
        self.extra_indexes = extra;
        self
    }

    pub fn model(&self) -> &Arc<ModelDef> {
        &self.model
    }

    /// Every index this repository queries, for table provisioning.
    pub fn indexes(&self) -> Vec<IndexDefinition> {
        let mut all = vec![
            self.entity_created_index.clone(),
            self.entity_record_index.clone(),
            self.target_feature_index.clone(),
            self.target_created_index.clone(),
            self.target_record_index.clone(),
        ];
        all.extend(self.extra_indexes.iter().cloned());
        all
    }

    fn table(&self) -> &str {
        self.model.table_name()
    }

    // ------------------------------------------------------------------
    // Indexed list reads (feature-entity partition)
    // ------------------------------------------------------------------

    pub async fn get_where(&self, params: WhereParams) -> Result<Vec<T>> {
        let index = self.select_entity_index(params.sort_key.as_ref()).clone();
        let query = self.build_index_query(index, json!(self.model.feature_entity()), params);
        debug!(table = %query.table, index = %query.index.name, "repository list read");
        let rows = self.store.get_many_by_index(query).await?;
        rows.into_iter().map(decode).collect()
    }

    pub async fn get_where_paging(
        &self,
        params: WhereParams,
        page: PageRequest,
    ) -> Result<Page<T>> {
        let index = self.select_entity_index(params.sort_key.as_ref()).clone();
        let query = self.build_index_query(index, json!(self.model.feature_entity()), params);
        let page = self
            .store
            .get_many_by_index_paginate(query, normalize_page(page))
            .await?;
        decode_page(page)
    }

    /// Single-result convenience read over the createdAtDate index.
    pub async fn get_one_by_condition(&self, query: FilterMap) -> Result<Option<T>> {
        let mut items = self
            .get_where(WhereParams {
                query: Some(query),
                limit: Some(1),
                ..Default::default()
            })
            .await?;
        Ok(if items.is_empty() {
            None
        } else {
            Some(items.swap_remove(0))
        })
    }

    // ------------------------------------------------------------------
    // Indexed list reads (target partition)
    // ------------------------------------------------------------------

    pub async fn target_get_where(&self, target_id: &str, params: WhereParams) -> Result<Vec<T>> {
        let rows = self.target_get_values(target_id, params).await?;
        rows.into_iter().map(decode).collect()
    }

    pub async fn target_get_where_paging(
        &self,
        target_id: &str,
        params: WhereParams,
        page: PageRequest,
    ) -> Result<Page<T>> {
        let page = self.target_get_values_paging(target_id, params, page).await?;
        decode_page(page)
    }

    /// Raw-row variant of [`target_get_where`](Self::target_get_where);
    /// the tenant+target layer reads relation shapes through it.
    pub(crate) async fn target_get_values(
        &self,
        target_id: &str,
        params: WhereParams,
    ) -> Result<Vec<Value>> {
        let index = self.select_target_index(params.sort_key.as_ref()).clone();
        let query = self.build_index_query(index, target_value(target_id)?, params);
        debug!(table = %query.table, index = %query.index.name, "repository target read");
        Ok(self.store.get_many_by_index(query).await?)
    }

    pub(crate) async fn target_get_values_paging(
        &self,
        target_id: &str,
        params: WhereParams,
        page: PageRequest,
    ) -> Result<Page<Value>> {
        let index = self.select_target_index(params.sort_key.as_ref()).clone();
        let query = self.build_index_query(index, target_value(target_id)?, params);
        Ok(self
            .store
            .get_many_by_index_paginate(query, normalize_page(page))
            .await?)
    }

    /// Rows under a target that belong to this specific feature kind:
    /// (targetId, featureEntity) index with sort-key equality on the model's
    /// own feature value. This is how unrelated entity kinds share a target
    /// without cross-contamination.
    pub(crate) async fn target_feature_get_values(
        &self,
        target_id: &str,
        params: WhereParams,
    ) -> Result<Vec<Value>> {
        let mut range = FilterMap::new();
        range.insert("eq".to_string(), json!(self.model.feature_entity()));
        let params = WhereParams {
            sort_key: Some(SortKeyParams::new(fields::FEATURE_ENTITY, range)),
            ..params
        };
        let query = self.build_index_query(
            self.target_feature_index.clone(),
            target_value(target_id)?,
            params,
        );
        Ok(self.store.get_many_by_index(query).await?)
    }

    // ------------------------------------------------------------------
    // Point reads / deletes
    // ------------------------------------------------------------------

    pub async fn get_one_by_id(&self, data_id: &str) -> Result<Option<T>> {
        match self.get_value_by_id(data_id).await? {
            Some(row) => Ok(Some(decode(row)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn get_value_by_id(&self, data_id: &str) -> Result<Option<Value>> {
        Ok(self.store.get_one_by_id(self.table(), data_id).await?)
    }

    pub async fn get_many_by_ids(&self, ids: &[String]) -> Result<Vec<T>> {
        let rows = self.get_values_by_ids(ids).await?;
        rows.into_iter().map(decode).collect()
    }

    pub(crate) async fn get_values_by_ids(&self, ids: &[String]) -> Result<Vec<Value>> {
        Ok(self.store.get_many_by_ids(self.table(), ids).await?)
    }

    pub async fn delete_one(&self, data_id: &str) -> Result<bool> {
        Ok(self.store.delete_one(self.table(), data_id).await?)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// The only path by which a new row is inserted: stamps creation
    /// metadata, enforces strict-required fields, and validates alias pairs
    /// before delegating to the engine.
    pub async fn create_one(&self, data: &T, session: Option<&SessionUser>) -> Result<T> {
        let record = to_record(data)?;
        let stored = self.create_value(record, session).await?;
        decode(stored)
    }

    pub(crate) async fn create_value(
        &self,
        mut record: Value,
        session: Option<&SessionUser>,
    ) -> Result<Value> {
        self.prepare_create(&mut record, session)?;
        Ok(self.store.create_one(self.table(), record).await?)
    }

    fn prepare_create(&self, record: &mut Value, session: Option<&SessionUser>) -> Result<()> {
        let entity = self.model.model_name().to_string();
        let obj = record
            .as_object_mut()
            .ok_or_else(|| RepoError::validation(format!("{entity}: record must be an object")))?;

        let has_id = obj
            .get(fields::ID)
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        if !has_id {
            return Err(RepoError::validation(format!(
                "{entity}: record requires a non-empty id"
            )));
        }

        obj.insert(
            fields::FEATURE_ENTITY.to_string(),
            json!(self.model.feature_entity()),
        );

        if value_absent(obj.get(fields::CREATED_AT_DATE)) {
            obj.insert(
                fields::CREATED_AT_DATE.to_string(),
                json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        let created_at = obj
            .get(fields::CREATED_AT_DATE)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let day_stamp = derive_day_stamp(&entity, &created_at)?;
        obj.insert(fields::CREATED_AT_DAY_STAMP.to_string(), json!(day_stamp));

        if let Some(session) = session {
            obj.insert(fields::CREATOR_USER_ID.to_string(), json!(session.user_id));
        }

        if value_absent(obj.get(fields::RECORD_DATE)) {
            obj.insert(fields::RECORD_DATE.to_string(), json!(day_stamp));
        }

        // Aliases first: a strictly-required field may be derived from its
        // alias source (e.g. orderId -> targetId).
        resolve_aliases(&self.model, obj)?;
        enforce_strict_required(&self.model, obj)?;
        Ok(())
    }

    /// Conditional update: stamps modification metadata, re-validates alias
    /// pairs over the patch, and appends a tenant-equality guard when the
    /// session is tenant-bound. Defense in depth against cross-tenant
    /// writes, independent of query-time filtering.
    pub async fn update_one(
        &self,
        data_id: &str,
        update_data: Value,
        session: Option<&SessionUser>,
        with_conditions: Vec<Condition>,
    ) -> Result<T> {
        let entity = self.model.model_name();
        let mut patch = update_data
            .as_object()
            .cloned()
            .ok_or_else(|| RepoError::validation(format!("{entity}: update patch must be an object")))?;

        // Identity, partition discriminator, and tenant ownership are
        // immutable: tenantId drives both the conditional guard and the
        // derived featureEntityTenantId composite, so a patch may never
        // move a row across tenants.
        patch.remove(fields::ID);
        patch.remove(fields::FEATURE_ENTITY);
        patch.remove(fields::TENANT_ID);
        patch.remove(fields::FEATURE_ENTITY_TENANT_ID);

        patch.insert(
            fields::LAST_MODIFIED_DATE.to_string(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let mut conditions = with_conditions;
        if let Some(session) = session {
            patch.insert(
                fields::LAST_MODIFIER_USER_ID.to_string(),
                json!(session.user_id),
            );
            if let Some(tenant_id) = &session.tenant_id {
                conditions.push(Condition::equals(fields::TENANT_ID, tenant_id.as_str()));
            }
        }

        resolve_aliases(&self.model, &mut patch)?;

        let stored = self
            .store
            .update_one(self.table(), data_id, Value::Object(patch), &conditions)
            .await?;
        decode(stored)
    }

    // ------------------------------------------------------------------
    // Backfill helpers
    // ------------------------------------------------------------------

    /// Validate and normalize a record carrying a historical
    /// `createdAtDate`, without persisting it. The day stamp is recomputed
    /// from the supplied timestamp, not from "now".
    pub fn validate_format_data(&self, data: &T) -> Result<Value> {
        let mut record = to_record(data)?;
        let entity = self.model.model_name().to_string();
        let obj = record
            .as_object_mut()
            .ok_or_else(|| RepoError::validation(format!("{entity}: record must be an object")))?;

        let created_at = obj
            .get(fields::CREATED_AT_DATE)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                RepoError::validation(format!("{entity}: createdAtDate is required for dump data"))
            })?
            .to_string();
        let day_stamp = derive_day_stamp(&entity, &created_at)?;
        obj.insert(fields::CREATED_AT_DAY_STAMP.to_string(), json!(day_stamp));
        obj.insert(
            fields::FEATURE_ENTITY.to_string(),
            json!(self.model.feature_entity()),
        );
        if value_absent(obj.get(fields::RECORD_DATE)) {
            obj.insert(fields::RECORD_DATE.to_string(), json!(day_stamp));
        }

        resolve_aliases(&self.model, obj)?;
        enforce_strict_required(&self.model, obj)?;
        Ok(record)
    }

    pub fn format_for_dump(&self, items: &[T]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.validate_format_data(item)).collect()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Assemble and run an index read against an arbitrary registered
    /// index. Decorating layers (tenant scoping) use this for their own
    /// index sets.
    pub(crate) async fn run_index_query(
        &self,
        index: IndexDefinition,
        partition_value: Value,
        params: WhereParams,
    ) -> Result<Vec<Value>> {
        let query = self.build_index_query(index, partition_value, params);
        debug!(table = %query.table, index = %query.index.name, "repository index read");
        Ok(self.store.get_many_by_index(query).await?)
    }

    fn select_entity_index(&self, sort_key: Option<&SortKeyParams>) -> &IndexDefinition {
        match sort_key {
            Some(sk) if sk.field_name == fields::RECORD_DATE => &self.entity_record_index,
            _ => &self.entity_created_index,
        }
    }

    fn select_target_index(&self, sort_key: Option<&SortKeyParams>) -> &IndexDefinition {
        match sort_key {
            Some(sk) if sk.field_name == fields::RECORD_DATE => &self.target_record_index,
            _ => &self.target_created_index,
        }
    }

    fn build_index_query(
        &self,
        index: IndexDefinition,
        partition_value: Value,
        mut params: WhereParams,
    ) -> IndexQuery {
        // The sort field is expressed as the range predicate; drop it from
        // the plain filter so the engine never sees it twice.
        if let Some(sk) = &params.sort_key {
            if let Some(filter) = params.query.as_mut() {
                filter.shift_remove(&sk.field_name);
            }
        }
        IndexQuery {
            table: self.table().to_string(),
            index,
            partition_value,
            filter: params.query.filter(|f| !f.is_empty()),
            sort_key_query: params
                .sort_key
                .map(|sk| sk.query)
                .filter(|q| !q.is_empty()),
            fields: self.resolve_fields(&params.fields),
            limit: params.limit,
            sort: params.sort,
        }
    }

    fn resolve_fields(&self, selection: &FieldSelection) -> Option<Vec<String>> {
        match selection {
            FieldSelection::All => None,
            FieldSelection::Explicit(list) => Some(list.clone()),
            FieldSelection::Lite => {
                let lite = self.model.lite_fields();
                (!lite.is_empty()).then(|| lite.to_vec())
            }
        }
    }
}

// ============================================================================
// Free Helpers
// ============================================================================

fn to_record<T: Serialize>(data: &T) -> Result<Value> {
    serde_json::to_value(data).map_err(|e| RepoError::Store(StoreError::from(e)))
}

fn decode<T: DeserializeOwned>(row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| RepoError::Store(StoreError::from(e)))
}

fn decode_page<T: DeserializeOwned>(page: Page<Value>) -> Result<Page<T>> {
    let items = page.items.into_iter().map(decode).collect::<Result<Vec<T>>>()?;
    Ok(Page {
        items,
        next_page_hash: page.next_page_hash,
    })
}

/// Empty-string cursors mean "first page".
fn normalize_page(page: PageRequest) -> PageRequest {
    PageRequest {
        next_page_hash: page.next_page_hash.filter(|h| !h.is_empty()),
        evaluation_limit: page.evaluation_limit,
    }
}

fn target_value(target_id: &str) -> Result<Value> {
    if target_id.trim().is_empty() {
        return Err(RepoError::validation("targetId must be a non-empty string"));
    }
    Ok(json!(target_id))
}

fn value_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Day stamp is the `YYYY-MM-DD` prefix of a valid RFC 3339 timestamp.
pub(crate) fn derive_day_stamp(entity: &str, created_at: &str) -> Result<String> {
    chrono::DateTime::parse_from_rfc3339(created_at).map_err(|_| {
        RepoError::validation(format!(
            "{entity}: createdAtDate '{created_at}' is not a valid timestamp"
        ))
    })?;
    created_at
        .get(..10)
        .map(str::to_string)
        .ok_or_else(|| RepoError::validation(format!("{entity}: createdAtDate is malformed")))
}

fn enforce_strict_required(
    model: &ModelDef,
    record: &serde_json::Map<String, Value>,
) -> Result<()> {
    for field in model.strict_required_fields() {
        let present = match record.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(RepoError::validation(format!(
                "{}: field '{}' is required",
                model.model_name(),
                field
            )));
        }
    }
    Ok(())
}

/// Keep every declared alias pair value-identical: derive the missing side,
/// reject divergence.
fn resolve_aliases(model: &ModelDef, record: &mut serde_json::Map<String, Value>) -> Result<()> {
    for alias in model.field_aliases() {
        let source = record.get(&alias.source).filter(|v| !v.is_null()).cloned();
        let dest = record.get(&alias.dest).filter(|v| !v.is_null()).cloned();
        match (source, dest) {
            (Some(s), Some(d)) if s != d => {
                return Err(RepoError::validation(format!(
                    "{}: aliased fields '{}' and '{}' must hold the same value",
                    model.model_name(),
                    alias.source,
                    alias.dest
                )));
            }
            (Some(s), None) => {
                record.insert(alias.dest.clone(), s);
            }
            (None, Some(d)) => {
                record.insert(alias.source.clone(), d);
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldSpec, ModelConfig, ModelRegistry};

    fn product_model() -> Arc<ModelDef> {
        let mut registry = ModelRegistry::new();
        registry
            .register(
                ModelConfig::new("ProductModel", "till_main")
                    .with_field("name", FieldSpec::required())
                    .with_field("barcode", FieldSpec::optional())
                    .with_alias("barcode", "sk01")
                    .with_strict_required("name"),
            )
            .unwrap()
    }

    #[test]
    fn test_day_stamp_derivation() {
        let stamp = derive_day_stamp("ProductModel", "2024-03-05T14:30:00.123Z").unwrap();
        assert_eq!(stamp, "2024-03-05");

        // Idempotent over the same input.
        let again = derive_day_stamp("ProductModel", "2024-03-05T14:30:00.123Z").unwrap();
        assert_eq!(stamp, again);
    }

    #[test]
    fn test_day_stamp_rejects_malformed_input() {
        for bad in ["", "yesterday", "2024-03-05", "2024-13-40T00:00:00Z"] {
            let err = derive_day_stamp("ProductModel", bad).unwrap_err();
            assert!(err.is_validation(), "{bad}");
        }
    }

    #[test]
    fn test_alias_fill_and_mismatch() {
        let model = product_model();

        let mut record = serde_json::Map::new();
        record.insert("barcode".to_string(), json!("4006381333931"));
        resolve_aliases(&model, &mut record).unwrap();
        assert_eq!(record.get("sk01"), Some(&json!("4006381333931")));

        record.insert("sk01".to_string(), json!("different"));
        let err = resolve_aliases(&model, &mut record).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("ProductModel"));
    }

    #[test]
    fn test_alias_backfills_source_from_dest() {
        let model = product_model();
        let mut record = serde_json::Map::new();
        record.insert("sk01".to_string(), json!("4006381333931"));
        resolve_aliases(&model, &mut record).unwrap();
        assert_eq!(record.get("barcode"), Some(&json!("4006381333931")));
    }

    #[test]
    fn test_strict_required_enforcement() {
        let model = product_model();

        let mut record = serde_json::Map::new();
        record.insert("name".to_string(), json!(""));
        assert!(enforce_strict_required(&model, &record).is_err());

        record.insert("name".to_string(), json!("Espresso beans"));
        assert!(enforce_strict_required(&model, &record).is_ok());
    }
}
