//! Write operations of [`SqliteIndicatorStore`].
//!
//! Appends read the latest record and insert its successor on separate
//! statements. Two writers racing on the same country both plan the same
//! year; the primary key admits the first insert and the second surfaces as
//! [`EngineError::Conflict`].

use log::{debug, info, warn};
use rusqlite::OptionalExtension;
use srb_core::{
    AppendPlan, CountryCode, EngineError, IndicatorMutations, IndicatorRecord, Ratio, Year,
    YearRange,
};

use crate::sqlite::{SqliteIndicatorStore, classify_write_error, decode_ratio};

const LATEST_RECORD_SQL: &str = "SELECT year, value
    FROM indicator_records
    WHERE country_code = ?1
    ORDER BY year DESC
    LIMIT 1";

const INSERT_RECORD_SQL: &str =
    "INSERT INTO indicator_records (country_code, year, value) VALUES (?1, ?2, ?3)";

const UPDATE_RECORD_SQL: &str = "UPDATE indicator_records
    SET value = ?3
    WHERE country_code = ?1 AND year = ?2";

const DELETE_RANGE_SQL: &str = "DELETE FROM indicator_records
    WHERE country_code = ?1 AND year BETWEEN ?2 AND ?3";

impl IndicatorMutations for SqliteIndicatorStore {
    fn plan_append(
        &self,
        country: &CountryCode,
        value: Option<Ratio>,
    ) -> Result<AppendPlan, EngineError> {
        let connection = self.connect()?;
        let latest: Option<(i32, f64)> = connection
            .query_row(LATEST_RECORD_SQL, [country.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .map_err(|source| EngineError::store("read latest record", source))?;
        let Some((year, latest_value)) = latest else {
            return Err(EngineError::NotFound {
                entity: "indicator history for country",
                key: country.to_string(),
            });
        };
        AppendPlan::from_latest(
            country.clone(),
            (Year::new(year), decode_ratio(latest_value)?),
            value,
        )
    }

    fn commit_append(&self, plan: &AppendPlan) -> Result<IndicatorRecord, EngineError> {
        let record = plan.record();
        let connection = self.connect()?;
        match connection.execute(
            INSERT_RECORD_SQL,
            rusqlite::params![record.country.as_str(), record.year.get(), record.value.get()],
        ) {
            Ok(_) => {
                info!("appended {} = {}", record.key(), record.value);
                Ok(record)
            }
            Err(source) => {
                let error = classify_write_error(
                    "insert indicator record",
                    record.country.as_str(),
                    record.key(),
                    source,
                );
                if matches!(error, EngineError::Conflict { .. }) {
                    warn!("append of {} lost to a concurrent writer", record.key());
                }
                Err(error)
            }
        }
    }

    fn update_value(
        &self,
        country: &CountryCode,
        year: Year,
        value: Ratio,
    ) -> Result<IndicatorRecord, EngineError> {
        let record = IndicatorRecord {
            country: country.clone(),
            year,
            value,
        };
        let connection = self.connect()?;
        let changed = connection
            .execute(
                UPDATE_RECORD_SQL,
                rusqlite::params![country.as_str(), year.get(), value.get()],
            )
            .map_err(|source| {
                classify_write_error(
                    "update indicator record",
                    country.as_str(),
                    record.key(),
                    source,
                )
            })?;
        if changed == 0 {
            debug!("update of {} matched no record", record.key());
            return Err(EngineError::NotFound {
                entity: "indicator record",
                key: record.key(),
            });
        }
        info!("updated {} = {value}", record.key());
        Ok(record)
    }

    fn delete_range(&self, country: &CountryCode, range: YearRange) -> Result<u64, EngineError> {
        let connection = self.connect()?;
        let removed = connection
            .execute(
                DELETE_RANGE_SQL,
                rusqlite::params![country.as_str(), range.start().get(), range.end().get()],
            )
            .map_err(|source| EngineError::store("delete indicator records", source))?;
        let removed = u64::try_from(removed)
            .map_err(|source| EngineError::store("count deleted records", source))?;
        info!(
            "deleted {removed} records for {country} between {} and {}",
            range.start(),
            range.end()
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestStore, country, ratio};
    use rstest::rstest;
    use srb_core::{ErrorKind, IndicatorQueries, ValueSource};

    #[rstest]
    fn testland_walkthrough() {
        let fixture = TestStore::seeded();
        let store = &fixture.store;
        let testland = country("TL");

        let appended = store
            .append_next_year(&testland, None)
            .expect("append next year");
        assert_eq!(appended.year, Year::new(2021));
        assert_eq!(appended.value, ratio(1.06));

        let updated = store
            .update_value(&testland, Year::new(2020), ratio(1.07))
            .expect("update 2020");
        assert_eq!(updated.value, ratio(1.07));

        let years: Vec<_> = store
            .series(&testland)
            .expect("series")
            .iter()
            .map(|point| point.year.get())
            .collect();
        assert_eq!(years, vec![2021, 2020, 2019]);

        let range = YearRange::new(Year::new(2019), Year::new(2019)).expect("range");
        assert_eq!(store.delete_range(&testland, range).expect("delete"), 1);
    }

    #[rstest]
    fn supplied_value_wins_over_carry_forward() {
        let fixture = TestStore::seeded();
        let plan = fixture
            .store
            .plan_append(&country("TL"), Some(ratio(1.2)))
            .expect("plan");
        assert_eq!(plan.source, ValueSource::Supplied);
        assert_eq!(plan.value, ratio(1.2));
    }

    #[rstest]
    fn append_without_history_is_not_found() {
        let fixture = TestStore::seeded();
        let error = fixture
            .store
            .append_next_year(&country("EA"), None)
            .expect_err("no history to extend");
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[rstest]
    fn stale_plan_conflicts() {
        let fixture = TestStore::seeded();
        let testland = country("TL");
        let first = fixture.store.plan_append(&testland, None).expect("plan");
        let second = fixture.store.plan_append(&testland, None).expect("plan");

        fixture.store.commit_append(&first).expect("first commit wins");
        let error = fixture
            .store
            .commit_append(&second)
            .expect_err("second commit conflicts");
        assert!(matches!(error, EngineError::Conflict { ref key, .. } if key == "TL/2021"));
    }

    #[rstest]
    fn commit_for_unknown_country_is_not_found() {
        let fixture = TestStore::seeded();
        let plan =
            AppendPlan::from_latest(country("ZZ"), (Year::new(2020), ratio(1.0)), None)
                .expect("plan");
        let error = fixture
            .store
            .commit_append(&plan)
            .expect_err("foreign key rejects unknown country");
        assert!(matches!(error, EngineError::NotFound { entity: "country", .. }));
    }

    #[rstest]
    fn update_of_missing_record_changes_nothing() {
        let fixture = TestStore::seeded();
        let testland = country("TL");
        let error = fixture
            .store
            .update_value(&testland, Year::new(1990), ratio(1.1))
            .expect_err("missing record");
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(fixture.store.series(&testland).expect("series").len(), 2);
    }

    #[rstest]
    fn empty_delete_is_not_an_error() {
        let fixture = TestStore::seeded();
        let range = YearRange::new(Year::new(1950), Year::new(1960)).expect("range");
        let removed = fixture
            .store
            .delete_range(&country("TL"), range)
            .expect("delete");
        assert_eq!(removed, 0);
    }
}
