//! Tenant Repository
//!
//! Makes tenant isolation structurally unavoidable: every read takes an
//! explicit tenant id and merges it into the filter before delegating, so a
//! caller cannot construct a query that omits tenant scoping. The write-side
//! guard lives in the base update path (tenant-equality condition from the
//! session), giving two independent layers of isolation.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use tp_common::SessionUser;
use tp_store::{
    Condition, FilterMap, IndexDefinition, Page, PageRequest, StoreEngine,
};

use crate::base::{BaseRepository, FieldSelection, SortKeyParams, WhereParams};
use crate::error::{RepoError, Result};
use crate::model::{fields, ModelDef};

pub struct TenantRepository<T> {
    base: BaseRepository<T>,
    tenant_index: IndexDefinition,
}

impl<T> TenantRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn StoreEngine>, model: Arc<ModelDef>) -> Self {
        let tenant_index =
            IndexDefinition::by_convention(fields::TENANT_ID, fields::FEATURE_ENTITY_TENANT_ID);
        let base = BaseRepository::new(store, model)
            .with_extra_indexes(vec![tenant_index.clone()]);
        Self { base, tenant_index }
    }

    pub fn model(&self) -> &Arc<ModelDef> {
        self.base.model()
    }

    pub fn indexes(&self) -> Vec<IndexDefinition> {
        self.base.indexes()
    }

    pub(crate) fn base(&self) -> &BaseRepository<T> {
        &self.base
    }

    /// `"<featureEntity>#<tenantId>"` — the composite partition value for
    /// "all rows of this kind within this tenant".
    pub fn feature_entity_tenant_id(&self, tenant_id: &str) -> String {
        format!("{}#{}", self.model().feature_entity(), tenant_id)
    }

    // ------------------------------------------------------------------
    // Reads (always tenant-scoped)
    // ------------------------------------------------------------------

    pub async fn get_where(&self, tenant_id: &str, params: WhereParams) -> Result<Vec<T>> {
        self.base
            .get_where(scope_to_tenant(tenant_id, params)?)
            .await
    }

    pub async fn get_where_paging(
        &self,
        tenant_id: &str,
        params: WhereParams,
        page: PageRequest,
    ) -> Result<Page<T>> {
        self.base
            .get_where_paging(scope_to_tenant(tenant_id, params)?, page)
            .await
    }

    pub async fn get_one_by_id_and_tenant_id(
        &self,
        data_id: &str,
        tenant_id: &str,
    ) -> Result<Option<T>> {
        validate_tenant_id(tenant_id)?;
        let row = self.base.get_value_by_id(data_id).await?;
        Ok(match row {
            Some(row) if row_in_tenant(&row, tenant_id) => Some(decode(row)?),
            _ => None,
        })
    }

    pub async fn get_many_by_ids_and_tenant_id(
        &self,
        ids: &[String],
        tenant_id: &str,
    ) -> Result<Vec<T>> {
        validate_tenant_id(tenant_id)?;
        let rows = self.base.get_values_by_ids(ids).await?;
        rows.into_iter()
            .filter(|row| row_in_tenant(row, tenant_id))
            .map(decode)
            .collect()
    }

    pub async fn get_one_by_tenant_id_and_condition(
        &self,
        tenant_id: &str,
        query: FilterMap,
    ) -> Result<Option<T>> {
        validate_tenant_id(tenant_id)?;
        let mut query = query;
        query.insert(fields::TENANT_ID.to_string(), json!(tenant_id));
        self.base.get_one_by_condition(query).await
    }

    /// Indexed partition scan of everything this tenant owns of this
    /// entity kind, via the (tenantId, featureEntityTenantId) index.
    pub async fn get_all_by_tenant_id(
        &self,
        tenant_id: &str,
        fields_selection: FieldSelection,
        limit: Option<u32>,
    ) -> Result<Vec<T>> {
        validate_tenant_id(tenant_id)?;
        let mut range = FilterMap::new();
        range.insert(
            "eq".to_string(),
            json!(self.feature_entity_tenant_id(tenant_id)),
        );
        let params = WhereParams {
            fields: fields_selection,
            limit,
            sort_key: Some(SortKeyParams::new(fields::FEATURE_ENTITY_TENANT_ID, range)),
            ..Default::default()
        };
        let rows = self
            .base
            .run_index_query(self.tenant_index.clone(), json!(tenant_id), params)
            .await?;
        rows.into_iter().map(decode).collect()
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Tenant rows must carry `tenantId`; the composite
    /// `featureEntityTenantId` key is derived here so callers never build
    /// it by hand.
    pub async fn create_one(&self, data: &T, session: Option<&SessionUser>) -> Result<T> {
        let mut record =
            serde_json::to_value(data).map_err(|e| RepoError::Store(e.into()))?;
        let tenant_id = record
            .get(fields::TENANT_ID)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                RepoError::validation(format!(
                    "{}: tenantId is required",
                    self.model().model_name()
                ))
            })?
            .to_string();
        if let Some(obj) = record.as_object_mut() {
            obj.insert(
                fields::FEATURE_ENTITY_TENANT_ID.to_string(),
                json!(self.feature_entity_tenant_id(&tenant_id)),
            );
        }
        let stored = self.base.create_value(record, session).await?;
        decode(stored)
    }

    pub async fn update_one(
        &self,
        data_id: &str,
        update_data: Value,
        session: Option<&SessionUser>,
        with_conditions: Vec<Condition>,
    ) -> Result<T> {
        self.base
            .update_one(data_id, update_data, session, with_conditions)
            .await
    }

    pub async fn delete_one(&self, data_id: &str) -> Result<bool> {
        self.base.delete_one(data_id).await
    }

    // ------------------------------------------------------------------
    // Backfill helpers
    // ------------------------------------------------------------------

    pub fn validate_format_data(&self, data: &T) -> Result<Value> {
        self.base.validate_format_data(data)
    }

    pub fn format_for_dump(&self, items: &[T]) -> Result<Vec<Value>> {
        self.base.format_for_dump(items)
    }
}

pub(crate) fn validate_tenant_id(tenant_id: &str) -> Result<()> {
    if tenant_id.trim().is_empty() {
        return Err(RepoError::validation("tenantId must be a non-empty string"));
    }
    Ok(())
}

/// Merge the tenant equality condition into the caller's filter.
pub(crate) fn scope_to_tenant(tenant_id: &str, mut params: WhereParams) -> Result<WhereParams> {
    validate_tenant_id(tenant_id)?;
    let mut query = params.query.take().unwrap_or_default();
    query.insert(fields::TENANT_ID.to_string(), json!(tenant_id));
    params.query = Some(query);
    Ok(params)
}

fn row_in_tenant(row: &Value, tenant_id: &str) -> bool {
    row.get(fields::TENANT_ID).and_then(Value::as_str) == Some(tenant_id)
}

fn decode<T: DeserializeOwned>(row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| RepoError::Store(e.into()))
}
