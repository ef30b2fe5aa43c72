//! Auth Token Repository
//!
//! Temp-table entity: rows expire automatically, so registration strictly
//! requires the expiry field.

use std::sync::Arc;

use tp_common::SessionUser;
use tp_repository::{
    fields, FieldSelection, FieldSpec, ModelConfig, ModelRegistry, TenantTargetRepository,
};
use tp_store::{FilterMap, StoreEngine};

use crate::domain::AuthToken;
use crate::error::Result;
use crate::repository::TEMP_TABLE;

pub struct AuthTokenRepository {
    repo: TenantTargetRepository<AuthToken>,
}

impl AuthTokenRepository {
    pub fn new(store: Arc<dyn StoreEngine>, registry: &mut ModelRegistry) -> Result<Self> {
        let model = registry.register(
            ModelConfig::new("AuthTokenModel", TEMP_TABLE)
                .temp_table()
                .with_field("accountId", FieldSpec::required())
                .with_field("kind", FieldSpec::required())
                .with_field("tokenHash", FieldSpec::required())
                .with_field(fields::DANGEROUSLY_EXPIRE_AT, FieldSpec::required())
                .with_field("tenantId", FieldSpec::required())
                .with_alias("accountId", fields::TARGET_ID)
                .with_strict_required("tokenHash")
                .with_strict_required("tenantId")
                .with_strict_required(fields::DANGEROUSLY_EXPIRE_AT),
        )?;
        Ok(Self {
            repo: TenantTargetRepository::new(store, model),
        })
    }

    pub async fn find_single(&self, tenant_id: &str, id: &str) -> Result<Option<AuthToken>> {
        Ok(self.repo.get_one_by_id_and_tenant_id(id, tenant_id).await?)
    }

    /// Live tokens issued for one account; expired rows are invisible.
    pub async fn find_for_account(
        &self,
        tenant_id: &str,
        account_id: &str,
    ) -> Result<Vec<AuthToken>> {
        Ok(self
            .repo
            .get_many_by_tenant_id_and_target_id_with_condition(
                tenant_id,
                account_id,
                FilterMap::new(),
                FieldSelection::All,
                None,
            )
            .await?)
    }

    pub async fn save(&self, token: &AuthToken, session: Option<&SessionUser>) -> Result<AuthToken> {
        Ok(self.repo.create_one(token, session).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.repo.delete_one(id).await?)
    }
}
