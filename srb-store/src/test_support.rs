//! Fixtures shared by unit, behaviour and CLI tests.
//!
//! The Testland dataset spans two regions:
//!
//! | Country | Sub-region | Records |
//! |---|---|---|
//! | Azuria (AZ) | Eastern Asia | 2019 1.12, 2020 1.13 |
//! | Borealia (BO) | Eastern Asia | 2020 1.09 |
//! | Testland (TL) | South-eastern Asia | 2019 1.05, 2020 1.06 |
//! | Castellan (CA) | South-eastern Asia | 2018 1.04, 2020 1.07 |
//! | Dunmark (DU) | Western Europe | 2020 1.06, 2021 1.05 |
//! | Fjordia (FJ) | Northern Europe | 2018 1.03 |
//! | Eastonia (EA) | Northern Europe | none |

#![expect(
    clippy::expect_used,
    reason = "fixtures abort the test on setup failure"
)]

use std::fmt::Debug;

use camino::Utf8PathBuf;
use srb_core::{Country, CountryCode, IndicatorRecord, Ratio, Region, SubRegion, Year};
use tempfile::TempDir;

use crate::{ReferenceDataset, SqliteIndicatorStore, StoreConfig};

/// Parse any code type, panicking on blank input.
#[must_use]
pub fn code<C>(raw: &str) -> C
where
    C: TryFrom<String>,
    C::Error: Debug,
{
    C::try_from(raw.to_owned()).expect("valid code")
}

/// Parse a country code.
#[must_use]
pub fn country(raw: &str) -> CountryCode {
    code(raw)
}

/// Build a ratio, panicking on invalid input.
#[must_use]
pub fn ratio(value: f64) -> Ratio {
    Ratio::new(value).expect("valid ratio")
}

/// Build an indicator record.
#[must_use]
pub fn record(country_code: &str, year: i32, value: f64) -> IndicatorRecord {
    IndicatorRecord {
        country: country(country_code),
        year: Year::new(year),
        value: ratio(value),
    }
}

fn region(code_raw: &str, name: &str) -> Region {
    Region {
        code: code(code_raw),
        name: name.to_owned(),
    }
}

fn sub_region(code_raw: &str, name: &str, parent: &str) -> SubRegion {
    SubRegion {
        code: code(code_raw),
        name: name.to_owned(),
        region: code(parent),
    }
}

/// Build a country inside sub-region `parent`.
#[must_use]
pub fn nation(code_raw: &str, name: &str, parent: &str) -> Country {
    Country {
        code: code(code_raw),
        name: name.to_owned(),
        sub_region: code(parent),
    }
}

/// The Testland reference dataset described in the module docs.
#[must_use]
pub fn testland_dataset() -> ReferenceDataset {
    ReferenceDataset {
        regions: vec![region("ASIA", "Asia"), region("EUR", "Europe")],
        sub_regions: vec![
            sub_region("EAS", "Eastern Asia", "ASIA"),
            sub_region("SEA", "South-eastern Asia", "ASIA"),
            sub_region("WEU", "Western Europe", "EUR"),
            sub_region("NEU", "Northern Europe", "EUR"),
        ],
        countries: vec![
            nation("AZ", "Azuria", "EAS"),
            nation("BO", "Borealia", "EAS"),
            nation("TL", "Testland", "SEA"),
            nation("CA", "Castellan", "SEA"),
            nation("DU", "Dunmark", "WEU"),
            nation("FJ", "Fjordia", "NEU"),
            nation("EA", "Eastonia", "NEU"),
        ],
        records: vec![
            record("TL", 2019, 1.05),
            record("TL", 2020, 1.06),
            record("AZ", 2019, 1.12),
            record("AZ", 2020, 1.13),
            record("BO", 2020, 1.09),
            record("CA", 2018, 1.04),
            record("CA", 2020, 1.07),
            record("DU", 2020, 1.06),
            record("DU", 2021, 1.05),
            record("FJ", 2018, 1.03),
        ],
    }
}

/// A store backed by a database inside a temporary directory.
///
/// The directory lives as long as the fixture.
#[derive(Debug)]
pub struct TestStore {
    /// Engine handle.
    pub store: SqliteIndicatorStore,
    /// Path of the database file.
    pub path: Utf8PathBuf,
    _dir: TempDir,
}

impl TestStore {
    /// A store with the schema but no rows.
    #[must_use]
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path =
            Utf8PathBuf::from_path_buf(dir.path().join("srb.db")).expect("utf-8 temp path");
        let store = SqliteIndicatorStore::create(StoreConfig::new(path.clone()))
            .expect("create store");
        Self {
            store,
            path,
            _dir: dir,
        }
    }

    /// A store provisioned with [`testland_dataset`].
    #[must_use]
    pub fn seeded() -> Self {
        Self::with_dataset(&testland_dataset())
    }

    /// A store provisioned with `dataset`.
    #[must_use]
    pub fn with_dataset(dataset: &ReferenceDataset) -> Self {
        let fixture = Self::empty();
        fixture.store.provision(dataset).expect("provision dataset");
        fixture
    }
}
