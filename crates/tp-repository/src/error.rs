//! Repository Error Types

use thiserror::Error;
use tp_store::StoreError;

#[derive(Error, Debug)]
pub enum RepoError {
    /// Recoverable input failure, raised before any store call. Controllers
    /// translate these into 4xx responses.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Programmer error surfaced at registration/startup time.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Engine failure, propagated unchanged. Conditional-check failures land
    /// here too and read as "not found / not authorized" upstream.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepoError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this is a recoverable bad-input failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, RepoError>;
