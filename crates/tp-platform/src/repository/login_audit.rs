//! Login Audit Repository
//!
//! Temp-table entity with a bounded retention window.

use std::sync::Arc;

use tp_common::SessionUser;
use tp_repository::{
    fields, FieldSpec, ModelConfig, ModelRegistry, TenantTargetRepository, WhereParams,
};
use tp_store::{Page, PageRequest, SortDirection, StoreEngine};

use crate::domain::LoginAudit;
use crate::error::Result;
use crate::repository::TEMP_TABLE;

pub struct LoginAuditRepository {
    repo: TenantTargetRepository<LoginAudit>,
}

impl LoginAuditRepository {
    pub fn new(store: Arc<dyn StoreEngine>, registry: &mut ModelRegistry) -> Result<Self> {
        let model = registry.register(
            ModelConfig::new("LoginAuditModel", TEMP_TABLE)
                .temp_table()
                .with_field("userId", FieldSpec::required())
                .with_field("outcome", FieldSpec::required())
                .with_field("ipAddress", FieldSpec::optional())
                .with_field("userAgent", FieldSpec::optional())
                .with_field(fields::DANGEROUSLY_EXPIRE_AT, FieldSpec::required())
                .with_field("tenantId", FieldSpec::required())
                .with_alias("userId", fields::TARGET_ID)
                .with_strict_required("tenantId")
                .with_strict_required(fields::DANGEROUSLY_EXPIRE_AT),
        )?;
        Ok(Self {
            repo: TenantTargetRepository::new(store, model),
        })
    }

    /// Audit writes never carry a session; the row itself names the user.
    pub async fn record(&self, entry: &LoginAudit) -> Result<LoginAudit> {
        Ok(self.repo.create_one(entry, None).await?)
    }

    pub async fn save(&self, entry: &LoginAudit, session: Option<&SessionUser>) -> Result<LoginAudit> {
        Ok(self.repo.create_one(entry, session).await?)
    }

    /// Login history for one user, newest first.
    pub async fn find_for_user(
        &self,
        tenant_id: &str,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<LoginAudit>> {
        let params = WhereParams {
            limit,
            sort: Some(SortDirection::Desc),
            ..Default::default()
        };
        Ok(self
            .repo
            .target_get_where(tenant_id, user_id, params)
            .await?)
    }

    pub async fn find_for_user_page(
        &self,
        tenant_id: &str,
        user_id: &str,
        limit: Option<u32>,
        page: PageRequest,
    ) -> Result<Page<LoginAudit>> {
        let params = WhereParams {
            limit,
            sort: Some(SortDirection::Desc),
            ..Default::default()
        };
        Ok(self
            .repo
            .target_get_where_paging(tenant_id, user_id, params, page)
            .await?)
    }
}
