//! Product Repository

use std::sync::Arc;

use serde_json::{json, Value};

use tp_common::SessionUser;
use tp_repository::{
    fields, FieldSpec, ModelConfig, ModelRegistry, QueryBuilder, TenantRepository,
};
use tp_store::{Condition, FilterMap, Page, PageRequest, StoreEngine};

use crate::domain::Product;
use crate::error::Result;
use crate::repository::MAIN_TABLE;

pub struct ProductRepository {
    repo: TenantRepository<Product>,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn StoreEngine>, registry: &mut ModelRegistry) -> Result<Self> {
        let model = registry.register(
            ModelConfig::new("ProductModel", MAIN_TABLE)
                .with_field("name", FieldSpec::required())
                .with_field("priceCents", FieldSpec::required())
                .with_field("barcode", FieldSpec::optional())
                .with_field("category", FieldSpec::optional())
                .with_field("stockQuantity", FieldSpec::optional())
                .with_field("tenantId", FieldSpec::required())
                .with_alias("barcode", fields::SK01)
                .with_strict_required("name")
                .with_strict_required("tenantId"),
        )?;
        Ok(Self {
            repo: TenantRepository::new(store, model),
        })
    }

    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new()
    }

    pub async fn find_single(&self, tenant_id: &str, id: &str) -> Result<Option<Product>> {
        Ok(self.repo.get_one_by_id_and_tenant_id(id, tenant_id).await?)
    }

    pub async fn get_with_ids(&self, tenant_id: &str, ids: &[String]) -> Result<Vec<Product>> {
        Ok(self
            .repo
            .get_many_by_ids_and_tenant_id(ids, tenant_id)
            .await?)
    }

    /// Barcode lookup through the aliased `sk01` slot.
    pub async fn find_by_barcode(&self, tenant_id: &str, barcode: &str) -> Result<Option<Product>> {
        let mut query = FilterMap::new();
        query.insert(fields::SK01.to_string(), json!(barcode));
        Ok(self
            .repo
            .get_one_by_tenant_id_and_condition(tenant_id, query)
            .await?)
    }

    pub async fn find_by_category(&self, tenant_id: &str, category: &str) -> Result<Vec<Product>> {
        let mut builder = self.query_builder();
        builder.add_query([("category".to_string(), json!(category))]);
        let params = super::where_params(&builder, None);
        Ok(self.repo.get_where(tenant_id, params).await?)
    }

    pub async fn find_page(
        &self,
        tenant_id: &str,
        builder: &QueryBuilder,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let params = super::where_params(builder, None);
        Ok(self.repo.get_where_paging(tenant_id, params, page).await?)
    }

    pub async fn save(&self, product: &Product, session: Option<&SessionUser>) -> Result<Product> {
        Ok(self.repo.create_one(product, session).await?)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: Value,
        session: Option<&SessionUser>,
        conditions: Vec<Condition>,
    ) -> Result<Product> {
        Ok(self.repo.update_one(id, patch, session, conditions).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.repo.delete_one(id).await?)
    }
}
