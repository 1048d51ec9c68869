//! Result shaping for the presentation layer.
//!
//! Engines return raw numeric rows. The shaper converts them into ordered
//! tables of display strings, applying one [`RatioPrecision`] to every ratio
//! so each operation formats values the same way. Row order is taken from the
//! engine unchanged.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    CatalogEntry, CountryValue, LatestObservation, MutationOutcome, Ratio, SeriesPoint,
    SubRegionAverage, Year,
};

/// Fixed number of fractional digits used for every ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioPrecision(usize);

impl RatioPrecision {
    /// Three fractional digits, matching the precision the store preserves.
    pub const DEFAULT: Self = Self(3);

    /// Use `digits` fractional digits.
    #[must_use]
    pub const fn new(digits: usize) -> Self {
        Self(digits)
    }

    /// Format `ratio` with the configured precision.
    ///
    /// ```
    /// use srb_core::{Ratio, RatioPrecision};
    ///
    /// let ratio = Ratio::new(1.0568).expect("valid ratio");
    /// assert_eq!(RatioPrecision::DEFAULT.format(ratio), "1.057");
    /// assert_eq!(RatioPrecision::new(2).format(ratio), "1.06");
    /// ```
    #[must_use]
    pub fn format(self, ratio: Ratio) -> String {
        format!("{:.*}", self.0, ratio.get())
    }
}

impl Default for RatioPrecision {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A row type the shaper knows how to render.
pub trait ShapeRow {
    /// Default table title.
    const TITLE: &'static str;
    /// Column headers, in cell order.
    const COLUMNS: &'static [&'static str];

    /// Render the row's cells in [`COLUMNS`](Self::COLUMNS) order.
    fn cells(&self, precision: RatioPrecision) -> Vec<String>;
}

impl ShapeRow for SeriesPoint {
    const TITLE: &'static str = "Sex ratio at birth by year";
    const COLUMNS: &'static [&'static str] = &["Year", "SRB"];

    fn cells(&self, precision: RatioPrecision) -> Vec<String> {
        vec![self.year.to_string(), precision.format(self.value)]
    }
}

impl ShapeRow for CountryValue {
    const TITLE: &'static str = "Sex ratio at birth by country";
    const COLUMNS: &'static [&'static str] = &["Country", "SRB"];

    fn cells(&self, precision: RatioPrecision) -> Vec<String> {
        vec![self.country_name.clone(), precision.format(self.value)]
    }
}

impl ShapeRow for SubRegionAverage {
    const TITLE: &'static str = "Average sex ratio at birth by sub-region";
    const COLUMNS: &'static [&'static str] = &["Sub-Region", "Avg SRB"];

    fn cells(&self, precision: RatioPrecision) -> Vec<String> {
        vec![self.sub_region_name.clone(), precision.format(self.average)]
    }
}

impl ShapeRow for LatestObservation {
    const TITLE: &'static str = "Latest sex ratio at birth";
    const COLUMNS: &'static [&'static str] = &["Country", "Year", "SRB"];

    fn cells(&self, precision: RatioPrecision) -> Vec<String> {
        vec![
            self.country_name.clone(),
            self.year.to_string(),
            precision.format(self.value),
        ]
    }
}

impl ShapeRow for CatalogEntry {
    const TITLE: &'static str = "Catalogue";
    const COLUMNS: &'static [&'static str] = &["Code", "Name"];

    fn cells(&self, _precision: RatioPrecision) -> Vec<String> {
        vec![self.code.clone(), self.name.clone()]
    }
}

impl ShapeRow for Year {
    const TITLE: &'static str = "Years";
    const COLUMNS: &'static [&'static str] = &["Year"];

    fn cells(&self, _precision: RatioPrecision) -> Vec<String> {
        vec![self.to_string()]
    }
}

/// Ordered, display-ready result of an engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ShapedTable {
    /// Table caption.
    pub title: String,
    /// Column headers.
    pub columns: Vec<String>,
    /// Rows of cells, one cell per column.
    pub rows: Vec<Vec<String>>,
}

impl ShapedTable {
    /// Replace the caption.
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Report whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Converts engine rows and mutation outcomes into [`ShapedTable`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultShaper {
    precision: RatioPrecision,
}

impl ResultShaper {
    /// Build a shaper using `precision` for every ratio.
    #[must_use]
    pub const fn new(precision: RatioPrecision) -> Self {
        Self { precision }
    }

    /// Shape `rows`, preserving their order.
    #[must_use]
    pub fn shape<R: ShapeRow>(&self, rows: &[R]) -> ShapedTable {
        ShapedTable {
            title: R::TITLE.to_owned(),
            columns: R::COLUMNS.iter().map(|&column| column.to_owned()).collect(),
            rows: rows.iter().map(|row| row.cells(self.precision)).collect(),
        }
    }

    /// Shape `rows` with a leading 1-based rank column.
    #[must_use]
    pub fn shape_ranked<R: ShapeRow>(&self, rows: &[R]) -> ShapedTable {
        let mut table = self.shape(rows);
        table.columns.insert(0, "#".to_owned());
        for (rank, row) in (1_usize..).zip(table.rows.iter_mut()) {
            row.insert(0, rank.to_string());
        }
        table
    }

    /// Shape a mutation outcome as a one-row summary.
    #[must_use]
    pub fn shape_outcome(&self, outcome: &MutationOutcome) -> ShapedTable {
        let (title, summary) = match outcome {
            MutationOutcome::Appended(record) => (
                "Added record",
                format!(
                    "Added {} for year {} (SRB {})",
                    record.country,
                    record.year,
                    self.precision.format(record.value)
                ),
            ),
            MutationOutcome::Updated(record) => (
                "Updated record",
                format!(
                    "Updated {} for year {} to SRB {}",
                    record.country,
                    record.year,
                    self.precision.format(record.value)
                ),
            ),
            MutationOutcome::Deleted {
                country,
                range,
                count,
            } => (
                "Deleted records",
                format!(
                    "Deleted {count} records for {country} between {} and {}",
                    range.start(),
                    range.end()
                ),
            ),
        };
        ShapedTable {
            title: title.to_owned(),
            columns: vec!["Result".to_owned()],
            rows: vec![vec![summary]],
        }
    }
}
