//! TillPoint Data-Access Core
//!
//! The tenant-scoped repository layer:
//! - Schema/model registry producing frozen per-entity metadata
//! - Query builder accumulating filter/range/count/sort intent
//! - Base repository: feature-entity partitioning, standard index set,
//!   record stamping, alias consistency, backfill helpers
//! - Tenant repository: mandatory tenant scoping on reads plus a
//!   conditional tenant guard on writes
//! - Tenant+target repository: a second association axis with relation
//!   reads
//!
//! Capabilities compose as wrappers around the base repository rather than
//! an inheritance chain, so each layer is independently testable.

pub mod base;
pub mod error;
pub mod model;
pub mod query;
pub mod target;
pub mod tenant;

pub use base::{BaseRepository, FieldSelection, SortKeyParams, WhereParams};
pub use error::{RepoError, Result};
pub use model::{
    fields, FieldAlias, FieldSpec, LiteFieldSpec, ModelConfig, ModelDef, ModelRegistry,
};
pub use query::{QueryBuilder, QueryProps};
pub use target::TenantTargetRepository;
pub use tenant::TenantRepository;
