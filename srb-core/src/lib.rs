//! Core domain types for the sex ratio at birth (SRB) reporting engine.
//!
//! The crate holds everything that does not need a database:
//! - the [`model`] of regions, sub-regions, countries and indicator records,
//!   with constructors that reject invalid input early;
//! - the [`EngineError`] taxonomy shared by every operation;
//! - the [`IndicatorQueries`], [`CatalogQueries`] and [`IndicatorMutations`]
//!   contracts implemented by storage backends;
//! - the [`ResultShaper`] that turns engine rows into display-ready tables.
//!
//! # Examples
//!
//! ```
//! use srb_core::{AppendPlan, CountryCode, Ratio, Year};
//!
//! # fn main() -> Result<(), srb_core::EngineError> {
//! let country = CountryCode::new("TL")?;
//! let latest = (Year::new(2020), Ratio::new(1.06)?);
//! let plan = AppendPlan::from_latest(country, latest, None)?;
//! assert_eq!(plan.year, Year::new(2021));
//! assert_eq!(plan.value, Ratio::new(1.06)?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
pub mod model;
mod mutation;
mod query;
pub mod shaper;

pub use error::{EngineError, ErrorKind};
pub use model::{
    Country, CountryCode, IndicatorRecord, Ratio, Region, RegionCode, SubRegion, SubRegionCode,
    Year,
};
pub use mutation::{AppendPlan, IndicatorMutations, MutationOutcome, ValueSource, YearRange};
pub use query::{
    CatalogEntry, CatalogQueries, CountryValue, IndicatorQueries, LatestObservation, SeriesPoint,
    SubRegionAverage, TopLimit,
};
pub use shaper::{RatioPrecision, ResultShaper, ShapeRow, ShapedTable};
