//! Facade crate for the SRB reporting and mutation engine.
//!
//! This crate re-exports the core domain types and engine contracts, and
//! exposes the SQLite store behind the `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use srb_core::{
    AppendPlan, CatalogEntry, CatalogQueries, Country, CountryCode, CountryValue, EngineError,
    ErrorKind, IndicatorMutations, IndicatorQueries, IndicatorRecord, LatestObservation,
    MutationOutcome, Ratio, RatioPrecision, Region, RegionCode, ResultShaper, SeriesPoint,
    ShapeRow, ShapedTable, SubRegion, SubRegionAverage, SubRegionCode, TopLimit, ValueSource,
    Year, YearRange,
};

#[cfg(feature = "store-sqlite")]
pub use srb_store::{
    DatasetError, ProvisionSummary, ReferenceDataset, SCHEMA_VERSION, SchemaError,
    SqliteIndicatorStore, StoreConfig, StoreOpenError, initialise_schema, load_dataset,
};
