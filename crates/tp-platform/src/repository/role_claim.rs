//! Role Claim Repository

use std::sync::Arc;

use serde_json::{json, Value};

use tp_common::SessionUser;
use tp_repository::{
    FieldSelection, FieldSpec, ModelConfig, ModelRegistry, QueryBuilder, TenantRepository,
};
use tp_store::{Condition, FilterMap, Page, PageRequest, StoreEngine};

use crate::domain::RoleClaim;
use crate::error::Result;
use crate::repository::MAIN_TABLE;

pub struct RoleClaimRepository {
    repo: TenantRepository<RoleClaim>,
}

impl RoleClaimRepository {
    pub fn new(store: Arc<dyn StoreEngine>, registry: &mut ModelRegistry) -> Result<Self> {
        let model = registry.register(
            ModelConfig::new("RoleClaimModel", MAIN_TABLE)
                .with_field("roleName", FieldSpec::required())
                .with_field("description", FieldSpec::optional())
                .with_field("claims", FieldSpec::optional())
                .with_field("tenantId", FieldSpec::required())
                .with_strict_required("roleName")
                .with_strict_required("tenantId"),
        )?;
        Ok(Self {
            repo: TenantRepository::new(store, model),
        })
    }

    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new()
    }

    pub async fn find_single(&self, tenant_id: &str, id: &str) -> Result<Option<RoleClaim>> {
        Ok(self.repo.get_one_by_id_and_tenant_id(id, tenant_id).await?)
    }

    pub async fn find_by_role_name(
        &self,
        tenant_id: &str,
        role_name: &str,
    ) -> Result<Option<RoleClaim>> {
        let mut query = FilterMap::new();
        query.insert("roleName".to_string(), json!(role_name));
        Ok(self
            .repo
            .get_one_by_tenant_id_and_condition(tenant_id, query)
            .await?)
    }

    pub async fn find_all(&self, tenant_id: &str) -> Result<Vec<RoleClaim>> {
        Ok(self
            .repo
            .get_all_by_tenant_id(tenant_id, FieldSelection::All, None)
            .await?)
    }

    pub async fn find_page(
        &self,
        tenant_id: &str,
        builder: &QueryBuilder,
        page: PageRequest,
    ) -> Result<Page<RoleClaim>> {
        let params = super::where_params(builder, None);
        Ok(self.repo.get_where_paging(tenant_id, params, page).await?)
    }

    pub async fn save(&self, role: &RoleClaim, session: Option<&SessionUser>) -> Result<RoleClaim> {
        Ok(self.repo.create_one(role, session).await?)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: Value,
        session: Option<&SessionUser>,
        conditions: Vec<Condition>,
    ) -> Result<RoleClaim> {
        Ok(self.repo.update_one(id, patch, session, conditions).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.repo.delete_one(id).await?)
    }
}
