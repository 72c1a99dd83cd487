//! # tally-store: The Data Store for Tally POS
//!
//! A path-addressed JSON document store behind the [`DataStore`] trait,
//! with two backends.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  CheckoutService / PayrollService (tally-terminal)                     │
//! │       │  Arc<dyn DataStore>                                             │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tally-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │   DataStore   │   │  MemoryStore  │   │  SqliteStore  │    │   │
//! │  │   │   (store.rs)  │◄──│  (memory.rs)  │   │  (sqlite.rs)  │    │   │
//! │  │   │ typed helpers │◄──┼───────────────┼───│ pool.rs       │    │   │
//! │  │   └───────────────┘   │ JSON tree     │   │ migrations.rs │    │   │
//! │  │                       └───────────────┘   └───────────────┘    │   │
//! │  │           path.rs (validation)   paths.rs (locations)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use tally_store::{DataStore, MemoryStore, paths};
//!
//! let store = MemoryStore::new();
//! let seq = store.increment(&paths::invoice_counter("main"), 1).await?;
//! ```

pub mod error;
pub mod memory;
pub mod migrations;
pub mod path;
pub mod paths;
pub mod pool;
pub mod sqlite;
pub mod store;
pub mod tree;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pool::DbConfig;
pub use sqlite::SqliteStore;
pub use store::{
    get_typed, list_typed, push_typed, query_typed, require_typed, set_typed, DataStore,
    MockDataStore,
};
