//! Auth Token Entity
//!
//! Short-lived verification/session tokens. Stored in the temp table and
//! expired by the engine via `dangerouslyExpireAt`; `accountId` is aliased
//! to `targetId` so "tokens issued for account X" is an indexed read.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use tp_common::TsidGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Session,
    EmailVerification,
    PasswordReset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub id: String,

    pub tenant_id: String,

    /// The account the token was issued for. Aliased to `targetId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,

    pub kind: TokenKind,

    pub token_hash: String,

    /// Expiry instant interpreted by the store engine (RFC 3339).
    pub dangerously_expire_at: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_day_stamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<String>,
}

impl AuthToken {
    pub fn new(
        tenant_id: impl Into<String>,
        account_id: impl Into<String>,
        kind: TokenKind,
        token_hash: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TsidGenerator::generate(),
            tenant_id: tenant_id.into(),
            account_id: Some(account_id.into()),
            target_id: None,
            kind,
            token_hash: token_hash.into(),
            dangerously_expire_at: expires_at.to_rfc3339(),
            created_at_date: None,
            created_at_day_stamp: None,
            record_date: None,
        }
    }

    /// Session token with a standard lifetime.
    pub fn session(
        tenant_id: impl Into<String>,
        account_id: impl Into<String>,
        token_hash: impl Into<String>,
    ) -> Self {
        Self::new(
            tenant_id,
            account_id,
            TokenKind::Session,
            token_hash,
            Utc::now() + Duration::hours(12),
        )
    }
}
