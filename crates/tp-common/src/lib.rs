use serde::{Deserialize, Serialize};

pub mod tsid;

pub use tsid::TsidGenerator;

// ============================================================================
// Session Identity
// ============================================================================

/// The acting identity threaded through every write.
///
/// Carries the user performing the request and, for tenant-scoped sessions,
/// the tenant the session is bound to. Repositories stamp the user id into
/// audit fields and use the tenant id as a conditional guard on updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
    pub tenant_id: Option<String>,
}

impl SessionUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn is_tenant_bound(&self) -> bool {
        self.tenant_id.is_some()
    }
}
