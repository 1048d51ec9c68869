//! Write contracts of the mutation engine.
//!
//! Each write is a single statement against the store. Appending the next
//! year is a read followed by an insert with nothing held in between; the
//! store's `(country, year)` uniqueness constraint decides which of two racing
//! appends wins.

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{CountryCode, EngineError, IndicatorRecord, Ratio, Year};

/// Inclusive range of years, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawYearRange")
)]
pub struct YearRange {
    start: Year,
    end: Year,
}

/// Unchecked wire form of [`YearRange`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawYearRange {
    start: Year,
    end: Year,
}

#[cfg(feature = "serde")]
impl TryFrom<RawYearRange> for YearRange {
    type Error = EngineError;

    fn try_from(raw: RawYearRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl YearRange {
    /// Validate and construct a range.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidInput`] when `start` is after `end`.
    ///
    /// # Examples
    ///
    /// ```
    /// use srb_core::{Year, YearRange};
    ///
    /// assert!(YearRange::new(Year::new(2019), Year::new(2019)).is_ok());
    /// assert!(YearRange::new(Year::new(2000), Year::new(1999)).is_err());
    /// ```
    pub fn new(start: Year, end: Year) -> Result<Self, EngineError> {
        if start > end {
            return Err(EngineError::invalid_input(
                "year range",
                format!("start year {start} is after end year {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// First year of the range.
    #[must_use]
    pub const fn start(self) -> Year {
        self.start
    }

    /// Last year of the range.
    #[must_use]
    pub const fn end(self) -> Year {
        self.end
    }

    /// Report whether `year` falls inside the range.
    #[must_use]
    pub fn contains(self, year: Year) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

/// Where the value of an appended record comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueSource {
    /// The caller supplied the value.
    Supplied,
    /// The value was copied unchanged from the latest existing record.
    CarriedForward {
        /// Year the value was copied from.
        from: Year,
    },
}

/// The record an append will insert, derived from the latest existing one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AppendPlan {
    /// Country to extend.
    pub country: CountryCode,
    /// `latest year + 1`.
    pub year: Year,
    /// Supplied value, or the latest value carried forward.
    pub value: Ratio,
    /// Provenance of [`value`](Self::value).
    pub source: ValueSource,
}

impl AppendPlan {
    /// Apply the carry-forward policy to the latest `(year, value)` record.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidInput`] when the latest year has no
    /// successor.
    pub fn from_latest(
        country: CountryCode,
        latest: (Year, Ratio),
        supplied: Option<Ratio>,
    ) -> Result<Self, EngineError> {
        let (latest_year, latest_value) = latest;
        let year = latest_year.next()?;
        let (value, source) = match supplied {
            Some(value) => (value, ValueSource::Supplied),
            None => (
                latest_value,
                ValueSource::CarriedForward { from: latest_year },
            ),
        };
        debug!("planned append for {country}: {year} = {value} ({source:?})");
        Ok(Self {
            country,
            year,
            value,
            source,
        })
    }

    /// The record this plan inserts.
    #[must_use]
    pub fn record(&self) -> IndicatorRecord {
        IndicatorRecord {
            country: self.country.clone(),
            year: self.year,
            value: self.value,
        }
    }
}

/// Result of a successful mutation, ready for shaping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MutationOutcome {
    /// A new record was appended.
    Appended(IndicatorRecord),
    /// An existing record now holds a new value.
    Updated(IndicatorRecord),
    /// Records in a range were removed.
    Deleted {
        /// Country whose records were targeted.
        country: CountryCode,
        /// Inclusive range of years.
        range: YearRange,
        /// Number of rows removed; zero is a valid outcome.
        count: u64,
    },
}

/// Year-sequenced insert, point update and ranged delete.
pub trait IndicatorMutations {
    /// Read the latest record of `country` and derive the next-year record.
    ///
    /// # Errors
    /// Returns [`EngineError::NotFound`] when the country has no records and
    /// [`EngineError::Store`] when the store cannot be queried.
    fn plan_append(
        &self,
        country: &CountryCode,
        value: Option<Ratio>,
    ) -> Result<AppendPlan, EngineError>;

    /// Insert the planned record.
    ///
    /// # Errors
    /// Returns [`EngineError::Conflict`] when a record for the planned
    /// `(country, year)` already exists.
    fn commit_append(&self, plan: &AppendPlan) -> Result<IndicatorRecord, EngineError>;

    /// Append `latest year + 1` for `country`, carrying the latest value
    /// forward when `value` is `None`.
    ///
    /// # Errors
    /// Returns [`EngineError::NotFound`] when the country has no records and
    /// [`EngineError::Conflict`] when a concurrent writer inserted the same
    /// year first.
    fn append_next_year(
        &self,
        country: &CountryCode,
        value: Option<Ratio>,
    ) -> Result<IndicatorRecord, EngineError> {
        let plan = self.plan_append(country, value)?;
        self.commit_append(&plan)
    }

    /// Set the value of the record identified by `(country, year)`.
    ///
    /// # Errors
    /// Returns [`EngineError::NotFound`] when no record matched; the store is
    /// left unchanged.
    fn update_value(
        &self,
        country: &CountryCode,
        year: Year,
        value: Ratio,
    ) -> Result<IndicatorRecord, EngineError>;

    /// Delete every record of `country` inside `range`, returning the count.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the store cannot be modified.
    fn delete_range(&self, country: &CountryCode, range: YearRange) -> Result<u64, EngineError>;
}
