//! Customer Entity

use serde::{Deserialize, Serialize};

use tp_common::TsidGenerator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,

    pub tenant_id: String,

    pub full_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Phone number mirrored into the indexed sort-key slot for lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sk01: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_code: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_day_stamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_user_id: Option<String>,
}

impl Customer {
    pub fn new(tenant_id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: TsidGenerator::generate(),
            tenant_id: tenant_id.into(),
            full_name: full_name.into(),
            phone: None,
            email: None,
            sk01: None,
            number_code: None,
            created_at_date: None,
            created_at_day_stamp: None,
            record_date: None,
            creator_user_id: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
