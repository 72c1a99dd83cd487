//! # API Error Type
//!
//! Unified error type returned by the terminal services.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  Frontend                    Terminal services                          │
//! │  ────────                    ─────────────────                          │
//! │                                                                         │
//! │  completeCheckout()                                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Service method → Result<T, ApiError>                            │  │
//! │  │         │                                                        │  │
//! │  │  Store error? ─── StoreError::PermissionDenied ──┐              │  │
//! │  │         │                                        ▼              │  │
//! │  │  Rule broken? ─── CoreError::InsufficientStock ─ ApiError ─────►│  │
//! │  │         │                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  toast(e.message), branch on e.code                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_store::StoreError;
use thiserror::Error;

/// Error payload handed to the UI.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Only 3 Cola in stock"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    /// Store unreachable or write rejected.
    StoreError,
    /// Business rule rejected the request.
    BusinessLogic,
    Internal,
    CartError,
    InsufficientStock,
    PaymentError,
    /// Checkout is in the wrong state for the request.
    InvalidState,
    /// Settings document missing or unusable.
    ConfigError,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ConfigError, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { path } => ApiError::new(
                ErrorCode::NotFound,
                format!("Nothing stored at {}", path),
            ),
            StoreError::InvalidPath { path, reason } => {
                ApiError::validation(format!("Invalid key '{}': {}", path, reason))
            }
            StoreError::PermissionDenied { path } => {
                tracing::warn!(%path, "Store rejected write");
                ApiError::new(ErrorCode::StoreError, "The store rejected the change")
            }
            StoreError::TypeMismatch { path, expected } => {
                tracing::error!(%path, %expected, "Stored value has unexpected type");
                ApiError::new(ErrorCode::StoreError, "Stored data is corrupt")
            }
            StoreError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::StoreError, "Store connection failed")
            }
            StoreError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::StoreError, "Store migration failed")
            }
            StoreError::PoolExhausted => {
                ApiError::new(ErrorCode::StoreError, "Store connection pool exhausted")
            }
            StoreError::QueryFailed(e) | StoreError::TransactionFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Store operation failed: {}", e);
                ApiError::new(ErrorCode::StoreError, "Store operation failed")
            }
            StoreError::Serialization(e) => {
                tracing::error!("Stored document unreadable: {}", e);
                ApiError::new(ErrorCode::StoreError, "Stored data is corrupt")
            }
            StoreError::Internal(e) => {
                tracing::error!("Internal store error: {}", e);
                ApiError::internal("Store operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::NotInCart(_) => ApiError::cart(err.to_string()),
            CoreError::InsufficientStock {
                product, available, ..
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!("Only {} {} in stock", available, product),
            ),
            CoreError::OutOfStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::EmptyCart => ApiError::cart(err.to_string()),
            CoreError::InsufficientPayment { .. } => {
                ApiError::new(ErrorCode::PaymentError, err.to_string())
            }
            CoreError::InvalidCheckoutState { .. } => {
                ApiError::new(ErrorCode::InvalidState, err.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Configuration Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine a configuration directory")]
    NoConfigDir,

    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::config(err.to_string())
    }
}
