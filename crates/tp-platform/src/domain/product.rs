//! Product Entity
//!
//! `barcode` is aliased to the indexed `sk01` slot so that barcode lookups
//! ride the standard sort-key convention.

use serde::{Deserialize, Serialize};

use tp_common::TsidGenerator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    pub tenant_id: String,

    pub name: String,

    /// Unit price in minor currency units
    pub price_cents: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,

    /// Alias of `barcode`; kept value-identical by the repository layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sk01: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_day_stamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_user_id: Option<String>,
}

impl Product {
    pub fn new(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
    ) -> Self {
        Self {
            id: TsidGenerator::generate(),
            tenant_id: tenant_id.into(),
            name: name.into(),
            price_cents,
            barcode: None,
            sk01: None,
            category: None,
            stock_quantity: None,
            created_at_date: None,
            created_at_day_stamp: None,
            record_date: None,
            creator_user_id: None,
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
