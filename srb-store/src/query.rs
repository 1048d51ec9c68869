//! Read operations of [`SqliteIndicatorStore`].

use log::debug;
use rusqlite::{Connection, Params, Row};
use srb_core::{
    CatalogEntry, CatalogQueries, CountryCode, CountryValue, EngineError, IndicatorQueries,
    LatestObservation, RegionCode, SeriesPoint, SubRegionAverage, SubRegionCode, TopLimit, Year,
};

use crate::sqlite::{SqliteIndicatorStore, decode_ratio, decode_years};

const SERIES_SQL: &str = "SELECT year, value
    FROM indicator_records
    WHERE country_code = ?1
    ORDER BY year DESC";

const SUB_REGION_YEAR_SQL: &str = "SELECT c.name, r.value
    FROM countries AS c
    JOIN indicator_records AS r ON r.country_code = c.code
    WHERE c.sub_region_code = ?1 AND r.year = ?2
    ORDER BY r.value ASC, c.name ASC, c.code ASC";

const REGION_AVERAGES_SQL: &str = "SELECT s.name, AVG(r.value) AS average
    FROM sub_regions AS s
    JOIN countries AS c ON c.sub_region_code = s.code
    JOIN indicator_records AS r ON r.country_code = c.code
    WHERE s.region_code = ?1 AND r.year = ?2
    GROUP BY s.code, s.name
    ORDER BY average ASC, s.name ASC, s.code ASC";

const SEARCH_LATEST_SQL: &str = "SELECT c.name, r.year, r.value
    FROM countries AS c
    JOIN indicator_records AS r ON r.country_code = c.code
    WHERE instr(srb_fold(c.name), srb_fold(?1)) > 0
      AND r.year = (
        SELECT MAX(latest.year)
        FROM indicator_records AS latest
        WHERE latest.country_code = c.code
      )
    ORDER BY c.name ASC, c.code ASC";

const TOP_N_SQL: &str = "SELECT c.name, r.value
    FROM indicator_records AS r
    JOIN countries AS c ON c.code = r.country_code
    WHERE r.year = ?1
    ORDER BY r.value DESC, c.name ASC, c.code ASC
    LIMIT ?2";

/// Run `sql` and collect every row through `map`.
fn fetch_rows<T, P, F>(
    connection: &Connection,
    operation: &'static str,
    sql: &str,
    params: P,
    map: F,
) -> Result<Vec<T>, EngineError>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut statement = connection
        .prepare_cached(sql)
        .map_err(|source| EngineError::store(operation, source))?;
    let rows = statement
        .query_map(params, map)
        .map_err(|source| EngineError::store(operation, source))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|source| EngineError::store(operation, source))
}

fn catalog_entry(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        code: row.get(0)?,
        name: row.get(1)?,
    })
}

fn name_value_rows(raw: Vec<(String, f64)>) -> Result<Vec<CountryValue>, EngineError> {
    raw.into_iter()
        .map(|(country_name, value)| {
            Ok(CountryValue {
                country_name,
                value: decode_ratio(value)?,
            })
        })
        .collect()
}

impl IndicatorQueries for SqliteIndicatorStore {
    fn series(&self, country: &CountryCode) -> Result<Vec<SeriesPoint>, EngineError> {
        let connection = self.connect()?;
        let raw = fetch_rows(
            &connection,
            "query country series",
            SERIES_SQL,
            [country.as_str()],
            |row| Ok((row.get::<_, i32>(0)?, row.get::<_, f64>(1)?)),
        )?;
        debug!("series for {country}: {} points", raw.len());
        raw.into_iter()
            .map(|(year, value)| {
                Ok(SeriesPoint {
                    year: Year::new(year),
                    value: decode_ratio(value)?,
                })
            })
            .collect()
    }

    fn sub_region_year(
        &self,
        sub_region: &SubRegionCode,
        year: Year,
    ) -> Result<Vec<CountryValue>, EngineError> {
        let connection = self.connect()?;
        let raw = fetch_rows(
            &connection,
            "query sub-region year",
            SUB_REGION_YEAR_SQL,
            rusqlite::params![sub_region.as_str(), year.get()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        debug!("sub-region {sub_region} in {year}: {} countries", raw.len());
        name_value_rows(raw)
    }

    fn region_year_averages(
        &self,
        region: &RegionCode,
        year: Year,
    ) -> Result<Vec<SubRegionAverage>, EngineError> {
        let connection = self.connect()?;
        let raw = fetch_rows(
            &connection,
            "query region averages",
            REGION_AVERAGES_SQL,
            rusqlite::params![region.as_str(), year.get()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
        )?;
        debug!("region {region} in {year}: {} sub-regions", raw.len());
        raw.into_iter()
            .map(|(sub_region_name, average)| {
                Ok(SubRegionAverage {
                    sub_region_name,
                    average: decode_ratio(average)?,
                })
            })
            .collect()
    }

    fn search_latest(&self, keyword: &str) -> Result<Vec<LatestObservation>, EngineError> {
        let connection = self.connect()?;
        let raw = fetch_rows(
            &connection,
            "search latest observations",
            SEARCH_LATEST_SQL,
            [keyword],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            },
        )?;
        debug!("search {keyword:?}: {} countries", raw.len());
        raw.into_iter()
            .map(|(country_name, year, value)| {
                Ok(LatestObservation {
                    country_name,
                    year: Year::new(year),
                    value: decode_ratio(value)?,
                })
            })
            .collect()
    }

    fn top_n(&self, year: Year, limit: TopLimit) -> Result<Vec<CountryValue>, EngineError> {
        let connection = self.connect()?;
        let raw = fetch_rows(
            &connection,
            "query top values",
            TOP_N_SQL,
            rusqlite::params![year.get(), limit.get()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        debug!("top {} in {year}: {} countries", limit.get(), raw.len());
        name_value_rows(raw)
    }
}

impl CatalogQueries for SqliteIndicatorStore {
    fn list_regions(&self) -> Result<Vec<CatalogEntry>, EngineError> {
        let connection = self.connect()?;
        fetch_rows(
            &connection,
            "list regions",
            "SELECT code, name FROM regions ORDER BY name ASC, code ASC",
            [],
            catalog_entry,
        )
    }

    fn list_sub_regions(&self) -> Result<Vec<CatalogEntry>, EngineError> {
        let connection = self.connect()?;
        fetch_rows(
            &connection,
            "list sub-regions",
            "SELECT code, name FROM sub_regions ORDER BY name ASC, code ASC",
            [],
            catalog_entry,
        )
    }

    fn list_countries(&self) -> Result<Vec<CatalogEntry>, EngineError> {
        let connection = self.connect()?;
        fetch_rows(
            &connection,
            "list countries",
            "SELECT code, name FROM countries ORDER BY name ASC, code ASC",
            [],
            catalog_entry,
        )
    }

    fn list_years(&self) -> Result<Vec<Year>, EngineError> {
        let connection = self.connect()?;
        let raw = fetch_rows(
            &connection,
            "list years",
            "SELECT DISTINCT year FROM indicator_records ORDER BY year DESC",
            [],
            |row| row.get(0),
        )?;
        Ok(decode_years(raw))
    }

    fn list_country_years(&self, country: &CountryCode) -> Result<Vec<Year>, EngineError> {
        let connection = self.connect()?;
        let raw = fetch_rows(
            &connection,
            "list country years",
            "SELECT year FROM indicator_records WHERE country_code = ?1 ORDER BY year DESC",
            [country.as_str()],
            |row| row.get(0),
        )?;
        Ok(decode_years(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestStore, code, country, nation, ratio, record, testland_dataset};
    use rstest::rstest;

    /// Testland plus an extra country and the given extra records.
    fn testland_with(
        countries: &[(&str, &str, &str)],
        records: &[(&str, i32, f64)],
    ) -> TestStore {
        let mut dataset = testland_dataset();
        dataset.countries.extend(
            countries
                .iter()
                .map(|&(code_raw, name, parent)| nation(code_raw, name, parent)),
        );
        dataset.records.extend(
            records
                .iter()
                .map(|&(owner, year, value)| record(owner, year, value)),
        );
        TestStore::with_dataset(&dataset)
    }

    fn searched(fixture: &TestStore, keyword: &str) -> Vec<String> {
        fixture
            .store
            .search_latest(keyword)
            .expect("search")
            .into_iter()
            .map(|row| row.country_name)
            .collect()
    }

    #[rstest]
    fn series_is_newest_first() {
        let fixture = TestStore::seeded();
        let series = fixture.store.series(&country("TL")).expect("query series");
        assert_eq!(
            series,
            vec![
                SeriesPoint {
                    year: Year::new(2020),
                    value: ratio(1.06),
                },
                SeriesPoint {
                    year: Year::new(2019),
                    value: ratio(1.05),
                },
            ]
        );
    }

    #[rstest]
    fn unknown_country_has_empty_series() {
        let fixture = TestStore::seeded();
        let series = fixture.store.series(&country("ZZ")).expect("query series");
        assert!(series.is_empty());
    }

    #[rstest]
    fn sub_region_year_orders_by_value() {
        let fixture = TestStore::seeded();
        let rows = fixture
            .store
            .sub_region_year(&code("SEA"), Year::new(2020))
            .expect("query sub-region");
        let names: Vec<_> = rows.iter().map(|row| row.country_name.as_str()).collect();
        assert_eq!(names, vec!["Testland", "Castellan"]);
    }

    #[rstest]
    fn sub_region_year_excludes_countries_without_that_year() {
        let fixture = TestStore::seeded();
        let rows = fixture
            .store
            .sub_region_year(&code("SEA"), Year::new(2018))
            .expect("query sub-region");
        let names: Vec<_> = rows.iter().map(|row| row.country_name.as_str()).collect();
        assert_eq!(names, vec!["Castellan"]);
    }

    #[rstest]
    fn region_averages_omit_empty_sub_regions() {
        let fixture = TestStore::seeded();
        let rows = fixture
            .store
            .region_year_averages(&code("EUR"), Year::new(2020))
            .expect("query averages");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sub_region_name, "Western Europe");
    }

    #[rstest]
    fn search_resolves_latest_year_per_country() {
        let fixture = TestStore::seeded();
        let rows = fixture.store.search_latest("IA").expect("search");
        let found: Vec<_> = rows
            .iter()
            .map(|row| (row.country_name.as_str(), row.year.get()))
            .collect();
        assert_eq!(found, vec![("Azuria", 2020), ("Borealia", 2020), ("Fjordia", 2018)]);
    }

    #[rstest]
    fn wildcard_characters_match_literally() {
        let fixture = TestStore::seeded();
        assert!(fixture.store.search_latest("%").expect("search").is_empty());
        assert!(fixture.store.search_latest("_").expect("search").is_empty());
    }

    #[rstest]
    #[case("Åland", &["Åland"])]
    #[case("åland", &["Åland"])]
    #[case("ÅLAND", &["Åland"])]
    #[case("türkiye", &["Türkiye"])]
    #[case("TÜRKIYE", &["Türkiye"])]
    #[case("LAND", &["Testland", "Åland"])]
    fn search_folds_non_ascii_case(#[case] keyword: &str, #[case] expected: &[&str]) {
        let fixture = testland_with(
            &[("AX", "Åland", "NEU"), ("TR", "Türkiye", "WEU")],
            &[("AX", 2020, 1.06), ("TR", 2020, 1.05)],
        );
        assert_eq!(searched(&fixture, keyword), expected);
    }

    #[rstest]
    fn empty_keyword_matches_every_recorded_country() {
        let fixture = TestStore::seeded();
        assert_eq!(
            searched(&fixture, ""),
            vec!["Azuria", "Borealia", "Castellan", "Dunmark", "Fjordia", "Testland"]
        );
    }

    #[rstest]
    fn sub_region_year_breaks_value_ties_by_name() {
        let fixture = testland_with(&[], &[("TL", 2022, 1.08), ("CA", 2022, 1.08)]);
        let rows = fixture
            .store
            .sub_region_year(&code("SEA"), Year::new(2022))
            .expect("query sub-region");
        let names: Vec<_> = rows.iter().map(|row| row.country_name.as_str()).collect();
        assert_eq!(names, vec!["Castellan", "Testland"]);
    }

    #[rstest]
    fn region_averages_break_ties_by_sub_region_name() {
        let fixture = testland_with(
            &[],
            &[
                ("TL", 2022, 1.08),
                ("CA", 2022, 1.08),
                ("AZ", 2022, 1.08),
                ("BO", 2022, 1.08),
            ],
        );
        let rows = fixture
            .store
            .region_year_averages(&code("ASIA"), Year::new(2022))
            .expect("query averages");
        let names: Vec<_> = rows.iter().map(|row| row.sub_region_name.as_str()).collect();
        assert_eq!(names, vec!["Eastern Asia", "South-eastern Asia"]);
        assert!(rows.iter().all(|row| row.average == ratio(1.08)));
    }

    #[rstest]
    fn top_n_breaks_ties_by_name() {
        let fixture = TestStore::seeded();
        let rows = fixture
            .store
            .top_n(Year::new(2020), TopLimit::DEFAULT)
            .expect("query top");
        let names: Vec<_> = rows.iter().map(|row| row.country_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Azuria", "Borealia", "Castellan", "Dunmark", "Testland"]
        );
    }

    #[rstest]
    fn catalogues_are_ordered_by_name() {
        let fixture = TestStore::seeded();
        let regions = fixture.store.list_regions().expect("list regions");
        let names: Vec<_> = regions.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["Asia", "Europe"]);

        let years = fixture.store.list_years().expect("list years");
        assert_eq!(
            years,
            vec![
                Year::new(2021),
                Year::new(2020),
                Year::new(2019),
                Year::new(2018)
            ]
        );

        let testland = fixture
            .store
            .list_country_years(&country("TL"))
            .expect("list country years");
        assert_eq!(testland, vec![Year::new(2020), Year::new(2019)]);
    }
}
