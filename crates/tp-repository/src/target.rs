//! Tenant+Target Repository
//!
//! Adds a second partition axis for "all records associated with entity Z"
//! queries that are also tenant-scoped (e.g. all login events for user Z
//! within tenant Y). Rows of this shape can never be created without a
//! target association: the constructor forces `targetId` into the model's
//! strict-required set.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use tp_common::SessionUser;
use tp_store::{Condition, FilterMap, IndexDefinition, Page, PageRequest, StoreEngine};

use crate::base::{FieldSelection, WhereParams};
use crate::error::{RepoError, Result};
use crate::model::{fields, ModelDef};
use crate::tenant::{scope_to_tenant, TenantRepository};

pub struct TenantTargetRepository<T> {
    tenant: TenantRepository<T>,
}

impl<T> TenantTargetRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn StoreEngine>, model: Arc<ModelDef>) -> Self {
        // A row of this shape must always carry its association.
        let model = Arc::new(model.require_strictly(fields::TARGET_ID));
        Self {
            tenant: TenantRepository::new(store, model),
        }
    }

    pub fn model(&self) -> &Arc<ModelDef> {
        self.tenant.model()
    }

    pub fn indexes(&self) -> Vec<IndexDefinition> {
        self.tenant.indexes()
    }

    // ------------------------------------------------------------------
    // Target-partitioned reads (tenant-scoped)
    // ------------------------------------------------------------------

    pub async fn target_get_where(
        &self,
        tenant_id: &str,
        target_id: &str,
        params: WhereParams,
    ) -> Result<Vec<T>> {
        self.tenant
            .base()
            .target_get_where(target_id, scope_to_tenant(tenant_id, params)?)
            .await
    }

    pub async fn target_get_where_paging(
        &self,
        tenant_id: &str,
        target_id: &str,
        params: WhereParams,
        page: PageRequest,
    ) -> Result<Page<T>> {
        self.tenant
            .base()
            .target_get_where_paging(target_id, scope_to_tenant(tenant_id, params)?, page)
            .await
    }

    /// Rows under this target that belong to this specific feature kind:
    /// (targetId, featureEntity) index with sort-key equality on the
    /// model's own feature value.
    pub async fn get_many_by_tenant_id_and_target_id_with_condition(
        &self,
        tenant_id: &str,
        target_id: &str,
        query: FilterMap,
        fields_selection: FieldSelection,
        limit: Option<u32>,
    ) -> Result<Vec<T>> {
        let params = WhereParams {
            query: Some(query),
            fields: fields_selection,
            limit,
            ..Default::default()
        };
        let rows = self
            .tenant
            .base()
            .target_feature_get_values(target_id, scope_to_tenant(tenant_id, params)?)
            .await?;
        rows.into_iter().map(decode).collect()
    }

    pub async fn get_one_by_tenant_id_and_target_id_with_condition(
        &self,
        tenant_id: &str,
        target_id: &str,
        query: FilterMap,
    ) -> Result<Option<T>> {
        let mut items = self
            .get_many_by_tenant_id_and_target_id_with_condition(
                tenant_id,
                target_id,
                query,
                FieldSelection::default(),
                Some(1),
            )
            .await?;
        Ok(if items.is_empty() {
            None
        } else {
            Some(items.swap_remove(0))
        })
    }

    // ------------------------------------------------------------------
    // Relation reads
    // ------------------------------------------------------------------

    /// Read rows of a related, denormalized shape through the target index
    /// while keeping the tenant/target scoping centralized here.
    pub async fn get_with_relation<R>(
        &self,
        tenant_id: &str,
        target_id: &str,
        params: WhereParams,
    ) -> Result<Vec<R>>
    where
        R: DeserializeOwned,
    {
        let rows = self
            .tenant
            .base()
            .target_get_values(target_id, scope_to_tenant(tenant_id, params)?)
            .await?;
        rows.into_iter().map(decode).collect()
    }

    pub async fn get_with_relation_paginate<R>(
        &self,
        tenant_id: &str,
        target_id: &str,
        params: WhereParams,
        page: PageRequest,
    ) -> Result<Page<R>>
    where
        R: DeserializeOwned,
    {
        let page = self
            .tenant
            .base()
            .target_get_values_paging(target_id, scope_to_tenant(tenant_id, params)?, page)
            .await?;
        let items = page
            .items
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<R>>>()?;
        Ok(Page {
            items,
            next_page_hash: page.next_page_hash,
        })
    }

    // ------------------------------------------------------------------
    // Point reads / writes (delegated to the tenant layer)
    // ------------------------------------------------------------------

    pub async fn get_one_by_id_and_tenant_id(
        &self,
        data_id: &str,
        tenant_id: &str,
    ) -> Result<Option<T>> {
        self.tenant.get_one_by_id_and_tenant_id(data_id, tenant_id).await
    }

    pub async fn create_one(&self, data: &T, session: Option<&SessionUser>) -> Result<T> {
        self.tenant.create_one(data, session).await
    }

    pub async fn update_one(
        &self,
        data_id: &str,
        update_data: Value,
        session: Option<&SessionUser>,
        with_conditions: Vec<Condition>,
    ) -> Result<T> {
        self.tenant
            .update_one(data_id, update_data, session, with_conditions)
            .await
    }

    pub async fn delete_one(&self, data_id: &str) -> Result<bool> {
        self.tenant.delete_one(data_id).await
    }
}

fn decode<T: DeserializeOwned>(row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| RepoError::Store(e.into()))
}
