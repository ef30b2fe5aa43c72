//! Login Audit Entity
//!
//! Bounded-lifetime audit trail of login attempts, one row per attempt,
//! stored in the temp table. `userId` is aliased to `targetId` so "logins
//! for user X" is an indexed read.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use tp_common::TsidGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoginOutcome {
    Success,
    BadCredentials,
    Locked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAudit {
    pub id: String,

    pub tenant_id: String,

    /// The user who attempted the login. Aliased to `targetId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,

    pub outcome: LoginOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Expiry instant interpreted by the store engine (RFC 3339).
    pub dangerously_expire_at: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_day_stamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<String>,
}

impl LoginAudit {
    /// Retention window for audit rows.
    const RETENTION_DAYS: i64 = 90;

    pub fn new(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        outcome: LoginOutcome,
    ) -> Self {
        Self::with_expiry(
            tenant_id,
            user_id,
            outcome,
            Utc::now() + Duration::days(Self::RETENTION_DAYS),
        )
    }

    pub fn with_expiry(
        tenant_id: impl Into<String>,
        user_id: impl Into<String>,
        outcome: LoginOutcome,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TsidGenerator::generate(),
            tenant_id: tenant_id.into(),
            user_id: Some(user_id.into()),
            target_id: None,
            outcome,
            ip_address: None,
            user_agent: None,
            dangerously_expire_at: expires_at.to_rfc3339(),
            created_at_date: None,
            created_at_day_stamp: None,
            record_date: None,
        }
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
