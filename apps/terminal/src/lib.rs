//! # Tally Terminal Library
//!
//! Orchestration for a single POS terminal: configuration, the Data Store
//! handle, the cashier's session and the services the UI calls.
//!
//! ## Module Organization
//! ```text
//! tally_terminal/
//! ├── lib.rs          ◄─── You are here (tracing + store bootstrap)
//! ├── config.rs       ◄─── AppConfig (TOML + TALLY_* env)
//! ├── error.rs        ◄─── ApiError returned by every service
//! ├── session.rs      ◄─── Session context (cashier, branch, settings, cache)
//! └── services/
//!     ├── checkout.rs ◄─── Cart editing + complete_checkout
//!     ├── held.rs     ◄─── Parked orders
//!     ├── customers.rs◄─── Lookup + loyalty points
//!     └── payroll.rs  ◄─── Monthly salary records
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. AppConfig::load(None)     defaults → config.toml → TALLY_* env     │
//! │  2. init_tracing(filter)      RUST_LOG wins over the config filter     │
//! │  3. open_store(&config)       MemoryStore or SqliteStore (migrated)    │
//! │  4. Session::start(...)       settings fail fast, products cached      │
//! │  5. CheckoutService::new(store)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod services;
pub mod session;

use std::sync::Arc;

use tally_store::{DataStore, DbConfig, MemoryStore, SqliteStore, StoreResult};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::{AppConfig, StoreBackend};
pub use error::{ApiError, ConfigError, ErrorCode};
pub use services::{
    CheckoutReceipt, CheckoutService, CustomerService, HeldOrderService, PayrollService,
    SalaryOutcome,
};
pub use session::Session;

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence; `default_filter` applies otherwise.
/// Safe to call more than once (later calls are ignored).
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Opens the configured Data Store backend.
pub async fn open_store(config: &AppConfig) -> StoreResult<Arc<dyn DataStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            let path = config.database_path();
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        tally_store::StoreError::ConnectionFailed(format!(
                            "cannot create {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
            info!(path = %path.display(), "Opening SQLite store");
            let db_config = DbConfig::new(path).max_connections(config.store.max_connections);
            Ok(Arc::new(SqliteStore::open(&db_config).await?))
        }
    }
}
