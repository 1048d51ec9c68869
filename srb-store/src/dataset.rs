//! Reference data provisioning.
//!
//! A dataset is a JSON document listing the hierarchy and the indicator
//! records:
//!
//! ```json
//! {
//!   "regions": [{ "code": "ASIA", "name": "Asia" }],
//!   "sub_regions": [{ "code": "SEA", "name": "South-eastern Asia", "region": "ASIA" }],
//!   "countries": [{ "code": "TL", "name": "Testland", "sub_region": "SEA" }],
//!   "records": [{ "country": "TL", "year": 2020, "value": 1.06 }]
//! }
//! ```
//!
//! Hierarchy rows are upserted so a dataset can refresh names. Indicator
//! records are inserted and must be new.

use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use rusqlite::{Error as SqliteError, Transaction};
use serde::{Deserialize, Serialize};
use srb_core::{Country, EngineError, IndicatorRecord, Region, SubRegion};
use thiserror::Error;

use crate::{fs::open_utf8_file, sqlite::SqliteIndicatorStore, sqlite::classify_write_error};

/// Hierarchy and indicator rows to load into a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDataset {
    /// Top-level regions.
    #[serde(default)]
    pub regions: Vec<Region>,
    /// Sub-regions, each referencing a region.
    #[serde(default)]
    pub sub_regions: Vec<SubRegion>,
    /// Countries, each referencing a sub-region.
    #[serde(default)]
    pub countries: Vec<Country>,
    /// Indicator observations, each referencing a country.
    #[serde(default)]
    pub records: Vec<IndicatorRecord>,
}

/// Row counts written by [`SqliteIndicatorStore::provision`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionSummary {
    /// Regions written.
    pub regions: usize,
    /// Sub-regions written.
    pub sub_regions: usize,
    /// Countries written.
    pub countries: usize,
    /// Indicator records inserted.
    pub records: usize,
}

/// Errors raised while reading or provisioning a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be opened.
    #[error("failed to open dataset {path:?}")]
    Open {
        /// Dataset path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The dataset file is not valid JSON or violates a model invariant.
    #[error("failed to parse dataset {path:?}")]
    Parse {
        /// Dataset path.
        path: Utf8PathBuf,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Opening the store or running a provisioning statement failed.
    #[error("failed to {operation} while provisioning")]
    Database {
        /// Provisioning step that failed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The store could not be reached.
    #[error("failed to connect to the store")]
    Connect(#[source] EngineError),
    /// A row was rejected by the store's constraints.
    #[error("dataset row {key} was rejected")]
    Rejected {
        /// Key of the offending row.
        key: String,
        /// Classified rejection.
        #[source]
        source: EngineError,
    },
}

/// Read a [`ReferenceDataset`] from a JSON file.
///
/// # Errors
/// Returns [`DatasetError::Open`] or [`DatasetError::Parse`] when the file is
/// missing, malformed, or holds blank codes or non-positive values.
pub fn load_dataset(path: &Utf8Path) -> Result<ReferenceDataset, DatasetError> {
    let file = open_utf8_file(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl SqliteIndicatorStore {
    /// Write `dataset` in a single transaction.
    ///
    /// Either every row lands or none does.
    ///
    /// # Errors
    /// Returns [`DatasetError::Rejected`] when a record duplicates an existing
    /// `(country, year)` or references an unknown parent, and
    /// [`DatasetError::Database`] for other store failures.
    pub fn provision(&self, dataset: &ReferenceDataset) -> Result<ProvisionSummary, DatasetError> {
        let mut connection = self.connect().map_err(DatasetError::Connect)?;
        let transaction = connection
            .transaction()
            .map_err(|source| DatasetError::Database {
                operation: "begin provisioning transaction",
                source,
            })?;

        let summary = ProvisionSummary {
            regions: upsert_regions(&transaction, &dataset.regions)?,
            sub_regions: upsert_sub_regions(&transaction, &dataset.sub_regions)?,
            countries: upsert_countries(&transaction, &dataset.countries)?,
            records: insert_records(&transaction, &dataset.records)?,
        };

        transaction
            .commit()
            .map_err(|source| DatasetError::Database {
                operation: "commit provisioning transaction",
                source,
            })?;
        info!(
            "provisioned {} regions, {} sub-regions, {} countries, {} records",
            summary.regions, summary.sub_regions, summary.countries, summary.records
        );
        Ok(summary)
    }
}

fn rejected_parent(key: String, entity: &'static str, parent: String) -> DatasetError {
    DatasetError::Rejected {
        key,
        source: EngineError::NotFound { entity, key: parent },
    }
}

fn is_foreign_key_violation(error: &SqliteError) -> bool {
    matches!(
        error,
        SqliteError::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

fn upsert_regions(transaction: &Transaction<'_>, regions: &[Region]) -> Result<usize, DatasetError> {
    let mut statement = transaction
        .prepare(
            "INSERT INTO regions (code, name) VALUES (?1, ?2)
             ON CONFLICT(code) DO UPDATE SET name = excluded.name",
        )
        .map_err(|source| DatasetError::Database {
            operation: "prepare region upsert",
            source,
        })?;
    for region in regions {
        statement
            .execute([region.code.as_str(), region.name.as_str()])
            .map_err(|source| DatasetError::Database {
                operation: "upsert region",
                source,
            })?;
    }
    Ok(regions.len())
}

fn upsert_sub_regions(
    transaction: &Transaction<'_>,
    sub_regions: &[SubRegion],
) -> Result<usize, DatasetError> {
    let mut statement = transaction
        .prepare(
            "INSERT INTO sub_regions (code, name, region_code) VALUES (?1, ?2, ?3)
             ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                region_code = excluded.region_code",
        )
        .map_err(|source| DatasetError::Database {
            operation: "prepare sub-region upsert",
            source,
        })?;
    for sub_region in sub_regions {
        statement
            .execute([
                sub_region.code.as_str(),
                sub_region.name.as_str(),
                sub_region.region.as_str(),
            ])
            .map_err(|source| {
                if is_foreign_key_violation(&source) {
                    rejected_parent(
                        sub_region.code.to_string(),
                        "region",
                        sub_region.region.to_string(),
                    )
                } else {
                    DatasetError::Database {
                        operation: "upsert sub-region",
                        source,
                    }
                }
            })?;
    }
    Ok(sub_regions.len())
}

fn upsert_countries(
    transaction: &Transaction<'_>,
    countries: &[Country],
) -> Result<usize, DatasetError> {
    let mut statement = transaction
        .prepare(
            "INSERT INTO countries (code, name, sub_region_code) VALUES (?1, ?2, ?3)
             ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                sub_region_code = excluded.sub_region_code",
        )
        .map_err(|source| DatasetError::Database {
            operation: "prepare country upsert",
            source,
        })?;
    for country in countries {
        statement
            .execute([
                country.code.as_str(),
                country.name.as_str(),
                country.sub_region.as_str(),
            ])
            .map_err(|source| {
                if is_foreign_key_violation(&source) {
                    rejected_parent(
                        country.code.to_string(),
                        "sub-region",
                        country.sub_region.to_string(),
                    )
                } else {
                    DatasetError::Database {
                        operation: "upsert country",
                        source,
                    }
                }
            })?;
    }
    Ok(countries.len())
}

fn insert_records(
    transaction: &Transaction<'_>,
    records: &[IndicatorRecord],
) -> Result<usize, DatasetError> {
    let mut statement = transaction
        .prepare("INSERT INTO indicator_records (country_code, year, value) VALUES (?1, ?2, ?3)")
        .map_err(|source| DatasetError::Database {
            operation: "prepare record insert",
            source,
        })?;
    for record in records {
        statement
            .execute(rusqlite::params![
                record.country.as_str(),
                record.year.get(),
                record.value.get()
            ])
            .map_err(|source| DatasetError::Rejected {
                key: record.key(),
                source: classify_write_error(
                    "insert dataset record",
                    record.country.as_str(),
                    record.key(),
                    source,
                ),
            })?;
    }
    Ok(records.len())
}
