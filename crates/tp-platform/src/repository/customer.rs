//! Customer Repository

use std::sync::Arc;

use serde_json::{json, Value};

use tp_common::SessionUser;
use tp_repository::{
    fields, FieldSpec, ModelConfig, ModelRegistry, QueryBuilder, TenantRepository,
};
use tp_store::{Condition, FilterMap, Page, PageRequest, StoreEngine};

use crate::domain::Customer;
use crate::error::Result;
use crate::repository::MAIN_TABLE;

pub struct CustomerRepository {
    repo: TenantRepository<Customer>,
}

impl CustomerRepository {
    pub fn new(store: Arc<dyn StoreEngine>, registry: &mut ModelRegistry) -> Result<Self> {
        let model = registry.register(
            ModelConfig::new("CustomerModel", MAIN_TABLE)
                .with_field("fullName", FieldSpec::required())
                .with_field("phone", FieldSpec::optional())
                .with_field("email", FieldSpec::optional())
                .with_field("tenantId", FieldSpec::required())
                .with_alias("phone", fields::SK01)
                .with_strict_required("fullName")
                .with_strict_required("tenantId"),
        )?;
        Ok(Self {
            repo: TenantRepository::new(store, model),
        })
    }

    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new()
    }

    pub async fn find_single(&self, tenant_id: &str, id: &str) -> Result<Option<Customer>> {
        Ok(self.repo.get_one_by_id_and_tenant_id(id, tenant_id).await?)
    }

    pub async fn get_with_ids(&self, tenant_id: &str, ids: &[String]) -> Result<Vec<Customer>> {
        Ok(self
            .repo
            .get_many_by_ids_and_tenant_id(ids, tenant_id)
            .await?)
    }

    /// Phone lookup through the aliased `sk01` slot.
    pub async fn find_by_phone(&self, tenant_id: &str, phone: &str) -> Result<Option<Customer>> {
        let mut query = FilterMap::new();
        query.insert(fields::SK01.to_string(), json!(phone));
        Ok(self
            .repo
            .get_one_by_tenant_id_and_condition(tenant_id, query)
            .await?)
    }

    pub async fn find_page(
        &self,
        tenant_id: &str,
        builder: &QueryBuilder,
        page: PageRequest,
    ) -> Result<Page<Customer>> {
        let params = super::where_params(builder, None);
        Ok(self.repo.get_where_paging(tenant_id, params, page).await?)
    }

    pub async fn save(&self, customer: &Customer, session: Option<&SessionUser>) -> Result<Customer> {
        Ok(self.repo.create_one(customer, session).await?)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: Value,
        session: Option<&SessionUser>,
        conditions: Vec<Condition>,
    ) -> Result<Customer> {
        Ok(self.repo.update_one(id, patch, session, conditions).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.repo.delete_one(id).await?)
    }
}
