//! Role and Claim Entities
//!
//! Authorization model: a role is a named bundle of claims scoped to a
//! tenant. Claims use the `resource.action` form; a legacy generation of
//! stored roles used `resource-action`, so reads pass every claim through
//! [`normalize_claim`] before evaluation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use tp_common::TsidGenerator;

/// Role definition, stored per tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleClaim {
    /// TSID as Crockford Base32 string
    pub id: String,

    pub tenant_id: String,

    /// Role name (unique per tenant by convention, e.g. "cashier")
    pub role_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Claims granted by this role, `resource.action` form
    #[serde(default)]
    pub claims: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_day_stamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_user_id: Option<String>,
}

impl RoleClaim {
    pub fn new(tenant_id: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            id: TsidGenerator::generate(),
            tenant_id: tenant_id.into(),
            role_name: role_name.into(),
            description: None,
            claims: Vec::new(),
            created_at_date: None,
            created_at_day_stamp: None,
            record_date: None,
            creator_user_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_claim(mut self, claim: impl Into<String>) -> Self {
        self.claims.push(claim.into());
        self
    }

    pub fn with_claims(mut self, claims: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for c in claims {
            self.claims.push(c.into());
        }
        self
    }

    /// The role's claims with legacy hyphenated values normalized,
    /// deduplicated.
    pub fn normalized_claims(&self) -> HashSet<String> {
        self.claims.iter().map(|c| normalize_claim(c)).collect()
    }

    pub fn has_claim(&self, claim: &str) -> bool {
        let wanted = normalize_claim(claim);
        self.claims.iter().any(|c| normalize_claim(c) == wanted)
    }
}

/// Normalize a claim string to `resource.action` form.
///
/// Already-dotted claims pass through unchanged; legacy hyphenated claims
/// get their first `-` replaced (`"order-view"` becomes `"order.view"`).
pub fn normalize_claim(claim: &str) -> String {
    if claim.contains('.') {
        return claim.to_string();
    }
    claim.replacen('-', ".", 1)
}

/// Claims catalog.
pub mod permissions {
    // Order claims
    pub const ORDER_VIEW: &str = "order.view";
    pub const ORDER_ADD: &str = "order.add";
    pub const ORDER_EDIT: &str = "order.edit";
    pub const ORDER_DELETE: &str = "order.delete";

    // Payment claims
    pub const PAYMENT_VIEW: &str = "payment.view";
    pub const PAYMENT_ADD: &str = "payment.add";
    pub const PAYMENT_REFUND: &str = "payment.refund";

    // Product claims
    pub const PRODUCT_VIEW: &str = "product.view";
    pub const PRODUCT_ADD: &str = "product.add";
    pub const PRODUCT_EDIT: &str = "product.edit";
    pub const PRODUCT_DELETE: &str = "product.delete";

    // Customer claims
    pub const CUSTOMER_VIEW: &str = "customer.view";
    pub const CUSTOMER_ADD: &str = "customer.add";
    pub const CUSTOMER_EDIT: &str = "customer.edit";
    pub const CUSTOMER_DELETE: &str = "customer.delete";

    // Role management claims
    pub const ROLE_VIEW: &str = "role.view";
    pub const ROLE_ADD: &str = "role.add";
    pub const ROLE_EDIT: &str = "role.edit";
    pub const ROLE_DELETE: &str = "role.delete";

    // Tenant settings claims
    pub const SETTINGS_VIEW: &str = "settings.view";
    pub const SETTINGS_EDIT: &str = "settings.edit";

    // Reporting claims
    pub const REPORT_VIEW: &str = "report.view";
}
