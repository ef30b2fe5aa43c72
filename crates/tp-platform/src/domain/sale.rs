//! Sales Entities
//!
//! A sale order plus its payments. Payments hang off the order through the
//! target axis: `orderId` is aliased to `targetId`, so "payments for order
//! X" is an indexed partition read.

use serde::{Deserialize, Serialize};

use tp_common::TsidGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    Paid,
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Open
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleOrder {
    pub id: String,

    pub tenant_id: String,

    #[serde(default)]
    pub status: OrderStatus,

    #[serde(default)]
    pub lines: Vec<OrderLine>,

    pub total_cents: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_code: Option<i64>,

    /// Business date of the sale (may lag `createdAtDate` for end-of-day
    /// captures); drives date-range listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_day_stamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_user_id: Option<String>,
}

impl SaleOrder {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            id: TsidGenerator::generate(),
            tenant_id: tenant_id.into(),
            status: OrderStatus::Open,
            lines: Vec::new(),
            total_cents: 0,
            customer_id: None,
            number_code: None,
            record_date: None,
            created_at_date: None,
            created_at_day_stamp: None,
            creator_user_id: None,
        }
    }

    pub fn with_line(mut self, product_id: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        self.lines.push(OrderLine {
            product_id: product_id.into(),
            quantity,
            unit_price_cents,
        });
        self.total_cents += quantity * unit_price_cents;
        self
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,

    pub tenant_id: String,

    /// The order this payment settles. Aliased to `targetId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,

    pub amount_cents: i64,

    pub method: PaymentMethod,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_day_stamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_user_id: Option<String>,
}

impl Payment {
    pub fn new(
        tenant_id: impl Into<String>,
        order_id: impl Into<String>,
        amount_cents: i64,
        method: PaymentMethod,
    ) -> Self {
        Self {
            id: TsidGenerator::generate(),
            tenant_id: tenant_id.into(),
            order_id: Some(order_id.into()),
            target_id: None,
            amount_cents,
            method,
            created_at_date: None,
            created_at_day_stamp: None,
            record_date: None,
            creator_user_id: None,
        }
    }
}
