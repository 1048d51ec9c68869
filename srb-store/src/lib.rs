//! SQLite storage for the SRB reporting engine.
//!
//! Responsibilities:
//! - Materialise the relational schema, including the `(country, year)`
//!   uniqueness constraint the mutation engine relies on.
//! - Provision reference data from JSON datasets.
//! - Implement the query and mutation contracts from `srb-core`.
//!
//! Invariants:
//! - No global mutable state. [`SqliteIndicatorStore`] is a cloneable handle;
//!   every operation opens its own connection.
//! - Store failures surface as typed [`srb_core::EngineError`]s, never as raw
//!   `rusqlite` errors.
//!
//! # Examples
//!
//! ```
//! use camino::Utf8PathBuf;
//! use srb_core::{CountryCode, IndicatorQueries};
//! use srb_store::{SqliteIndicatorStore, StoreConfig};
//!
//! let dir = tempfile::tempdir().expect("create temp dir");
//! let path = Utf8PathBuf::from_path_buf(dir.path().join("srb.db")).expect("utf-8 path");
//! let store = SqliteIndicatorStore::create(StoreConfig::new(path)).expect("create store");
//!
//! let series = store.series(&CountryCode::new("TL").expect("code")).expect("query series");
//! assert!(series.is_empty());
//! ```

#![forbid(unsafe_code)]

mod config;
mod dataset;
mod fs;
mod mutation;
mod query;
mod schema;
mod sqlite;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::StoreConfig;
pub use dataset::{DatasetError, ProvisionSummary, ReferenceDataset, load_dataset};
pub use schema::{SCHEMA_VERSION, SchemaError, initialise_schema};
pub use sqlite::{SqliteIndicatorStore, StoreOpenError};
