//! Schema model: the geographic hierarchy and the indicator observations.
//!
//! Region, sub-region and country rows are reference data provisioned once.
//! Indicator records are owned by the store and identified by
//! `(country, year)`.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::EngineError;

macro_rules! code_type {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(
            feature = "serde",
            derive(Serialize, Deserialize),
            serde(try_from = "String", into = "String")
        )]
        pub struct $name(String);

        impl $name {
            /// Validate and construct the code.
            ///
            /// Surrounding whitespace is trimmed.
            ///
            /// # Errors
            /// Returns [`EngineError::InvalidInput`] when the code is blank.
            pub fn new(code: impl Into<String>) -> Result<Self, EngineError> {
                let raw = code.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(EngineError::invalid_input($field, "code must not be blank"));
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Borrow the code as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = EngineError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(code: $name) -> Self {
                code.0
            }
        }
    };
}

code_type!(
    /// Key of a [`Region`].
    RegionCode,
    "region code"
);
code_type!(
    /// Key of a [`SubRegion`].
    SubRegionCode,
    "sub-region code"
);
code_type!(
    /// Key of a [`Country`].
    CountryCode,
    "country code"
);

/// Calendar year of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Year(i32);

impl Year {
    /// Wrap a calendar year.
    #[must_use]
    pub const fn new(year: i32) -> Self {
        Self(year)
    }

    /// Return the raw year.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Return the following year.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidInput`] when the year cannot be
    /// incremented.
    pub fn next(self) -> Result<Self, EngineError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or_else(|| EngineError::invalid_input("year", "no year follows i32::MAX"))
    }
}

impl From<i32> for Year {
    fn from(year: i32) -> Self {
        Self(year)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Observed sex ratio at birth.
///
/// Any finite, strictly positive value is accepted; no plausibility range is
/// enforced.
///
/// # Examples
///
/// ```
/// use srb_core::Ratio;
///
/// assert!(Ratio::new(1.07).is_ok());
/// assert!(Ratio::new(0.0).is_err());
/// assert!(Ratio::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct Ratio(f64);

impl Ratio {
    /// Validate and construct a ratio.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidInput`] when the value is not finite or
    /// not strictly positive.
    pub fn new(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() {
            return Err(EngineError::invalid_input("value", "ratio must be a finite number"));
        }
        if value <= 0.0 {
            return Err(EngineError::invalid_input("value", "ratio must be positive"));
        }
        Ok(Self(value))
    }

    /// Return the raw value.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Ratio {
    type Error = EngineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ratio> for f64 {
    fn from(ratio: Ratio) -> Self {
        ratio.0
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Top level of the geographic hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    /// Unique region code.
    pub code: RegionCode,
    /// Display name.
    pub name: String,
}

/// Grouping of countries inside a [`Region`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubRegion {
    /// Unique sub-region code.
    pub code: SubRegionCode,
    /// Display name.
    pub name: String,
    /// Owning region.
    pub region: RegionCode,
}

/// A country tracked by the indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Country {
    /// Unique country code.
    pub code: CountryCode,
    /// Display name, matched by keyword search.
    pub name: String,
    /// Owning sub-region.
    pub sub_region: SubRegionCode,
}

/// One `(country, year, value)` observation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndicatorRecord {
    /// Observed country.
    pub country: CountryCode,
    /// Observation year.
    pub year: Year,
    /// Observed ratio.
    pub value: Ratio,
}

impl IndicatorRecord {
    /// Human-readable composite key used in error messages.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.country, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn codes_reject_blank_input(#[case] raw: &str) {
        let error = CountryCode::new(raw).expect_err("blank code should fail");
        assert!(matches!(
            error,
            EngineError::InvalidInput { field: "country code", .. }
        ));
    }

    #[rstest]
    fn codes_are_trimmed() {
        let code = SubRegionCode::new("  SEA ").expect("valid code");
        assert_eq!(code.as_str(), "SEA");
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.05)]
    #[case(f64::INFINITY)]
    #[case(f64::NAN)]
    fn ratio_rejects_non_positive_or_non_finite(#[case] value: f64) {
        assert!(Ratio::new(value).is_err());
    }

    #[rstest]
    #[case(0.001)]
    #[case(1.05)]
    #[case(250.0)]
    fn ratio_accepts_any_positive_value(#[case] value: f64) {
        let ratio = Ratio::new(value).expect("positive ratio");
        assert_eq!(ratio.get(), value);
    }

    #[rstest]
    fn year_next_increments() {
        assert_eq!(Year::new(2020).next().expect("next year"), Year::new(2021));
    }

    #[rstest]
    fn year_next_rejects_overflow() {
        assert!(Year::new(i32::MAX).next().is_err());
    }

    #[rstest]
    fn record_key_joins_country_and_year() {
        let record = IndicatorRecord {
            country: CountryCode::new("TL").expect("code"),
            year: Year::new(2019),
            value: Ratio::new(1.05).expect("ratio"),
        };
        assert_eq!(record.key(), "TL/2019");
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn serde_rejects_invalid_ratio() {
        let parsed: Result<Ratio, _> = serde_json::from_str("-2.0");
        assert!(parsed.is_err());
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn serde_round_trips_country() {
        let json = r#"{"code":"TL","name":"Testland","sub_region":"SEA"}"#;
        let country: Country = serde_json::from_str(json).expect("parse country");
        assert_eq!(country.code.as_str(), "TL");
        assert_eq!(country.sub_region.as_str(), "SEA");
    }
}
