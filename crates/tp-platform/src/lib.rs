//! TillPoint Platform
//!
//! Domain layer for the point-of-sale back office:
//! - Role/claim authorization model with legacy claim normalization
//! - Customers, products, sales orders and payments
//! - Ephemeral auth tokens and login audit trail (auto-expiring)
//! - One typed repository per entity over the tenant-scoped data-access
//!   core, wired by a single composition root

pub mod domain;
pub mod error;
pub mod repository;

pub use domain::*;
pub use error::PlatformError;
pub use repository::Repositories;
