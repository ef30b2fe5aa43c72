//! Domain Entities

pub mod auth_token;
pub mod customer;
pub mod login_audit;
pub mod product;
pub mod role_claim;
pub mod sale;

pub use auth_token::{AuthToken, TokenKind};
pub use customer::Customer;
pub use login_audit::{LoginAudit, LoginOutcome};
pub use product::Product;
pub use role_claim::{normalize_claim, permissions, RoleClaim};
pub use sale::{OrderLine, OrderStatus, Payment, PaymentMethod, SaleOrder};
