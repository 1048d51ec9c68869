//! Read-only contracts of the query engine.
//!
//! Every operation is pure and independently retryable. An empty result is a
//! successful answer; only store failures surface as errors.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{CountryCode, EngineError, Ratio, RegionCode, SubRegionCode, Year};

/// One point of a country's time series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeriesPoint {
    /// Observation year.
    pub year: Year,
    /// Observed ratio.
    pub value: Ratio,
}

/// A country's value in a cross-sectional comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CountryValue {
    /// Country display name.
    pub country_name: String,
    /// Observed ratio for the requested year.
    pub value: Ratio,
}

/// Mean ratio across the contributing countries of a sub-region.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubRegionAverage {
    /// Sub-region display name.
    pub sub_region_name: String,
    /// Arithmetic mean of the contributing values.
    pub average: Ratio,
}

/// A country's most recent observation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatestObservation {
    /// Country display name.
    pub country_name: String,
    /// The country's own maximum recorded year.
    pub year: Year,
    /// Ratio recorded for that year.
    pub value: Ratio,
}

/// A `(code, name)` pair from the reference catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CatalogEntry {
    /// Entity code.
    pub code: String,
    /// Entity display name.
    pub name: String,
}

/// Maximum number of rows returned by a top-N ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TopLimit(u32);

impl TopLimit {
    /// Limit used when the caller does not supply one.
    pub const DEFAULT: Self = Self(10);

    /// Validate and construct a limit.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidInput`] when `limit` is zero.
    pub fn new(limit: u32) -> Result<Self, EngineError> {
        if limit == 0 {
            return Err(EngineError::invalid_input("limit", "limit must be at least 1"));
        }
        Ok(Self(limit))
    }

    /// Return the raw limit.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for TopLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Time-series, cross-sectional, grouped, search and ranking reads.
///
/// Tie orders are deterministic:
///
/// | Operation | Order |
/// |---|---|
/// | [`series`](Self::series) | year descending |
/// | [`sub_region_year`](Self::sub_region_year) | value ascending, then country name, then code |
/// | [`region_year_averages`](Self::region_year_averages) | average ascending, then sub-region name, then code |
/// | [`search_latest`](Self::search_latest) | country name ascending, then code |
/// | [`top_n`](Self::top_n) | value descending, then country name, then code |
pub trait IndicatorQueries {
    /// Return every `(year, value)` recorded for `country`, newest first.
    ///
    /// Unknown countries yield an empty series.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn series(&self, country: &CountryCode) -> Result<Vec<SeriesPoint>, EngineError>;

    /// Compare the countries of `sub_region` that have a record for `year`.
    ///
    /// Countries without a record for `year` are excluded.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn sub_region_year(
        &self,
        sub_region: &SubRegionCode,
        year: Year,
    ) -> Result<Vec<CountryValue>, EngineError>;

    /// Average the `year` values of each sub-region of `region`.
    ///
    /// Sub-regions without contributing records are omitted.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn region_year_averages(
        &self,
        region: &RegionCode,
        year: Year,
    ) -> Result<Vec<SubRegionAverage>, EngineError>;

    /// Return the latest observation of every country whose name contains
    /// `keyword`, ignoring case.
    ///
    /// The keyword is matched literally. Countries without records are
    /// excluded.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn search_latest(&self, keyword: &str) -> Result<Vec<LatestObservation>, EngineError>;

    /// Return the `limit` highest values recorded in `year`.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn top_n(&self, year: Year, limit: TopLimit) -> Result<Vec<CountryValue>, EngineError>;
}

/// Reference lookups used to populate selection lists.
pub trait CatalogQueries {
    /// All regions ordered by name.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn list_regions(&self) -> Result<Vec<CatalogEntry>, EngineError>;

    /// All sub-regions ordered by name.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn list_sub_regions(&self) -> Result<Vec<CatalogEntry>, EngineError>;

    /// All countries ordered by name.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn list_countries(&self) -> Result<Vec<CatalogEntry>, EngineError>;

    /// Distinct years holding at least one record, newest first.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn list_years(&self) -> Result<Vec<Year>, EngineError>;

    /// Years recorded for `country`, newest first.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be queried.
    fn list_country_years(&self, country: &CountryCode) -> Result<Vec<Year>, EngineError>;
}
