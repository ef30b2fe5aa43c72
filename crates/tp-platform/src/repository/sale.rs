//! Sales Repositories
//!
//! Orders list by business date (`recordDate` index); payments are read
//! through the target axis keyed by their order.

use std::sync::Arc;

use serde_json::{json, Value};

use tp_common::SessionUser;
use tp_repository::{
    fields, FieldSelection, FieldSpec, ModelConfig, ModelRegistry, QueryBuilder, SortKeyParams,
    TenantRepository, TenantTargetRepository, WhereParams,
};
use tp_store::{Condition, FilterMap, Page, PageRequest, SortDirection, StoreEngine};

use crate::domain::{Payment, SaleOrder};
use crate::error::Result;
use crate::repository::MAIN_TABLE;

pub struct SaleOrderRepository {
    repo: TenantRepository<SaleOrder>,
}

impl SaleOrderRepository {
    pub fn new(store: Arc<dyn StoreEngine>, registry: &mut ModelRegistry) -> Result<Self> {
        let model = registry.register(
            ModelConfig::new("SaleOrderModel", MAIN_TABLE)
                .with_field("status", FieldSpec::required())
                .with_field("lines", FieldSpec::optional())
                .with_field("totalCents", FieldSpec::required())
                .with_field("customerId", FieldSpec::optional())
                .with_field("tenantId", FieldSpec::required())
                .with_strict_required("tenantId"),
        )?;
        Ok(Self {
            repo: TenantRepository::new(store, model),
        })
    }

    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new()
    }

    pub async fn find_single(&self, tenant_id: &str, id: &str) -> Result<Option<SaleOrder>> {
        Ok(self.repo.get_one_by_id_and_tenant_id(id, tenant_id).await?)
    }

    /// Orders within a business-date window, oldest first, full rows.
    /// Routed to the recordDate index by the sort-key field name.
    pub async fn find_by_record_date_range(
        &self,
        tenant_id: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<SaleOrder>> {
        let mut range = FilterMap::new();
        range.insert("between".to_string(), json!([from, to]));
        let params = WhereParams {
            fields: FieldSelection::All,
            sort: Some(SortDirection::Asc),
            sort_key: Some(SortKeyParams::new(fields::RECORD_DATE, range)),
            ..Default::default()
        };
        Ok(self.repo.get_where(tenant_id, params).await?)
    }

    pub async fn find_page(
        &self,
        tenant_id: &str,
        builder: &QueryBuilder,
        page: PageRequest,
    ) -> Result<Page<SaleOrder>> {
        let params = super::where_params(builder, Some(fields::RECORD_DATE));
        Ok(self.repo.get_where_paging(tenant_id, params, page).await?)
    }

    pub async fn save(&self, order: &SaleOrder, session: Option<&SessionUser>) -> Result<SaleOrder> {
        Ok(self.repo.create_one(order, session).await?)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: Value,
        session: Option<&SessionUser>,
        conditions: Vec<Condition>,
    ) -> Result<SaleOrder> {
        Ok(self.repo.update_one(id, patch, session, conditions).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.repo.delete_one(id).await?)
    }
}

pub struct PaymentRepository {
    repo: TenantTargetRepository<Payment>,
}

impl PaymentRepository {
    pub fn new(store: Arc<dyn StoreEngine>, registry: &mut ModelRegistry) -> Result<Self> {
        let model = registry.register(
            ModelConfig::new("PaymentModel", MAIN_TABLE)
                .with_field("orderId", FieldSpec::required())
                .with_field("amountCents", FieldSpec::required())
                .with_field("method", FieldSpec::required())
                .with_field("tenantId", FieldSpec::required())
                .with_alias("orderId", fields::TARGET_ID)
                .with_strict_required("tenantId"),
        )?;
        Ok(Self {
            repo: TenantTargetRepository::new(store, model),
        })
    }

    pub async fn find_single(&self, tenant_id: &str, id: &str) -> Result<Option<Payment>> {
        Ok(self.repo.get_one_by_id_and_tenant_id(id, tenant_id).await?)
    }

    /// All payments settling one order, full rows.
    pub async fn find_for_order(&self, tenant_id: &str, order_id: &str) -> Result<Vec<Payment>> {
        Ok(self
            .repo
            .get_many_by_tenant_id_and_target_id_with_condition(
                tenant_id,
                order_id,
                FilterMap::new(),
                FieldSelection::All,
                None,
            )
            .await?)
    }

    pub async fn find_for_order_page(
        &self,
        tenant_id: &str,
        order_id: &str,
        limit: Option<u32>,
        page: PageRequest,
    ) -> Result<Page<Payment>> {
        let params = WhereParams {
            limit,
            ..Default::default()
        };
        Ok(self
            .repo
            .target_get_where_paging(tenant_id, order_id, params, page)
            .await?)
    }

    pub async fn save(&self, payment: &Payment, session: Option<&SessionUser>) -> Result<Payment> {
        Ok(self.repo.create_one(payment, session).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.repo.delete_one(id).await?)
    }

    /// Sum of payments recorded against an order, in minor units.
    pub async fn total_paid(&self, tenant_id: &str, order_id: &str) -> Result<i64> {
        let payments = self.find_for_order(tenant_id, order_id).await?;
        Ok(payments.iter().map(|p| p.amount_cents).sum())
    }
}
