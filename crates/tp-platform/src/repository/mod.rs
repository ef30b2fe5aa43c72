//! Concrete Repositories
//!
//! One thin typed repository per domain entity, built from the core
//! tenant/target layers. [`Repositories`] is the composition root: it owns
//! the model registry, registers every model exactly once, and hands each
//! repository its frozen definition.

use std::sync::Arc;

use tracing::info;

use tp_repository::{ModelRegistry, QueryBuilder, SortKeyParams, WhereParams};
use tp_store::StoreEngine;

use crate::error::Result;

pub mod auth_token;
pub mod customer;
pub mod login_audit;
pub mod product;
pub mod role_claim;
pub mod sale;

pub use auth_token::AuthTokenRepository;
pub use customer::CustomerRepository;
pub use login_audit::LoginAuditRepository;
pub use product::ProductRepository;
pub use role_claim::RoleClaimRepository;
pub use sale::{PaymentRepository, SaleOrderRepository};

/// Primary document table.
pub const MAIN_TABLE: &str = "till_main";

/// Table for bounded-lifetime rows (tokens, audit trail); the engine
/// expires rows via `dangerouslyExpireAt`.
pub const TEMP_TABLE: &str = "till_temp";

/// All platform repositories, wired against one store engine.
pub struct Repositories {
    pub role_claims: RoleClaimRepository,
    pub customers: CustomerRepository,
    pub products: ProductRepository,
    pub sale_orders: SaleOrderRepository,
    pub payments: PaymentRepository,
    pub auth_tokens: AuthTokenRepository,
    pub login_audits: LoginAuditRepository,
}

impl Repositories {
    pub fn new(store: Arc<dyn StoreEngine>) -> Result<Self> {
        let mut registry = ModelRegistry::new();

        let repos = Self {
            role_claims: RoleClaimRepository::new(store.clone(), &mut registry)?,
            customers: CustomerRepository::new(store.clone(), &mut registry)?,
            products: ProductRepository::new(store.clone(), &mut registry)?,
            sale_orders: SaleOrderRepository::new(store.clone(), &mut registry)?,
            payments: PaymentRepository::new(store.clone(), &mut registry)?,
            auth_tokens: AuthTokenRepository::new(store.clone(), &mut registry)?,
            login_audits: LoginAuditRepository::new(store, &mut registry)?,
        };
        info!("platform repositories initialized");
        Ok(repos)
    }
}

/// Turn accumulated query-builder intent into repository read parameters.
/// The sort-key field name is the caller's choice of sort axis; the
/// builder only carries the range predicate.
pub fn where_params(builder: &QueryBuilder, sort_key_field: Option<&str>) -> WhereParams {
    let props = builder.props();
    WhereParams {
        query: builder.build_query(),
        limit: props.count,
        sort: props.sort,
        sort_key: sort_key_field.and_then(|field| {
            builder
                .build_sort_key_query()
                .map(|range| SortKeyParams::new(field, range))
        }),
        ..Default::default()
    }
}
