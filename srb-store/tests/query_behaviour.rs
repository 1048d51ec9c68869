//! Behavioural tests for the query engine using rstest-bdd.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use srb_core::{
    CatalogEntry, CatalogQueries, CountryValue, EngineError, IndicatorQueries,
    LatestObservation, SeriesPoint, SubRegionAverage, TopLimit, Year,
};
use srb_store::test_support::{TestStore, code};

/// Shared state for query scenarios.
struct QueryWorld {
    fixture: RefCell<Option<TestStore>>,
    series: RefCell<Vec<SeriesPoint>>,
    values: RefCell<Vec<CountryValue>>,
    averages: RefCell<Vec<SubRegionAverage>>,
    latest: RefCell<Vec<LatestObservation>>,
}

impl QueryWorld {
    fn new() -> Self {
        Self {
            fixture: RefCell::new(None),
            series: RefCell::new(Vec::new()),
            values: RefCell::new(Vec::new()),
            averages: RefCell::new(Vec::new()),
            latest: RefCell::new(Vec::new()),
        }
    }

    fn with_store<T>(&self, query: impl FnOnce(&TestStore) -> Result<T, EngineError>) -> T {
        let borrowed = self.fixture.borrow();
        let fixture = borrowed
            .as_ref()
            .expect("dataset should be provisioned before querying");
        query(fixture).expect("query should succeed")
    }

    fn code_named(&self, name: &str, entries: &[CatalogEntry]) -> String {
        entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.code.clone())
            .unwrap_or_else(|| panic!("no catalogue entry named {name}"))
    }
}

#[fixture]
fn world() -> QueryWorld {
    QueryWorld::new()
}

fn names(values: &[CountryValue]) -> Vec<&str> {
    values.iter().map(|row| row.country_name.as_str()).collect()
}

#[given("the Testland reference dataset")]
fn given_dataset(world: &QueryWorld) {
    world.fixture.replace(Some(TestStore::seeded()));
}

#[when("I request the series for {name}")]
fn when_series(world: &QueryWorld, name: String) {
    let countries = world.with_store(|fixture| fixture.store.list_countries());
    let country = code(&world.code_named(&name, &countries));
    let series = world.with_store(|fixture| fixture.store.series(&country));
    world.series.replace(series);
}

#[when("I compare {name} in {year}")]
fn when_compare(world: &QueryWorld, name: String, year: i32) {
    let sub_regions = world.with_store(|fixture| fixture.store.list_sub_regions());
    let sub_region = code(&world.code_named(&name, &sub_regions));
    let rows =
        world.with_store(|fixture| fixture.store.sub_region_year(&sub_region, Year::new(year)));
    world.values.replace(rows);
}

#[when("I average the sub-regions of {name} in {year}")]
fn when_average(world: &QueryWorld, name: String, year: i32) {
    let regions = world.with_store(|fixture| fixture.store.list_regions());
    let region = code(&world.code_named(&name, &regions));
    let rows =
        world.with_store(|fixture| fixture.store.region_year_averages(&region, Year::new(year)));
    world.averages.replace(rows);
}

#[when("I search for the keyword \"{keyword}\"")]
fn when_search(world: &QueryWorld, keyword: String) {
    let rows = world.with_store(|fixture| fixture.store.search_latest(&keyword));
    world.latest.replace(rows);
}

#[when("I rank the top {limit} countries in {year}")]
fn when_rank(world: &QueryWorld, limit: u32, year: i32) {
    let limit = TopLimit::new(limit).expect("positive limit");
    let rows = world.with_store(|fixture| fixture.store.top_n(Year::new(year), limit));
    world.values.replace(rows);
}

#[then("the series years are {first} then {second}")]
fn then_series_years(world: &QueryWorld, first: i32, second: i32) {
    let years: Vec<_> = world
        .series
        .borrow()
        .iter()
        .map(|point| point.year.get())
        .collect();
    assert_eq!(years, vec![first, second]);
}

#[then("the countries are Testland then Castellan")]
fn then_sub_region_order(world: &QueryWorld) {
    assert_eq!(names(&world.values.borrow()), vec!["Testland", "Castellan"]);
}

#[then("only Western Europe is reported")]
fn then_only_western_europe(world: &QueryWorld) {
    let averages = world.averages.borrow();
    let reported: Vec<_> = averages
        .iter()
        .map(|row| row.sub_region_name.as_str())
        .collect();
    assert_eq!(reported, vec!["Western Europe"]);
}

#[then("South-eastern Asia averages 1.065 before Eastern Asia averages 1.11")]
fn then_asia_averages(world: &QueryWorld) {
    let averages = world.averages.borrow();
    assert_eq!(averages.len(), 2);
    assert_eq!(averages[0].sub_region_name, "South-eastern Asia");
    assert!((averages[0].average.get() - 1.065).abs() < 1e-9);
    assert_eq!(averages[1].sub_region_name, "Eastern Asia");
    assert!((averages[1].average.get() - 1.11).abs() < 1e-9);
}

#[then("Fjordia is reported for 2018 and Azuria for 2020")]
fn then_latest_years(world: &QueryWorld) {
    let latest = world.latest.borrow();
    let year_of = |name: &str| {
        latest
            .iter()
            .find(|row| row.country_name == name)
            .map(|row| row.year.get())
    };
    assert_eq!(year_of("Fjordia"), Some(2018));
    assert_eq!(year_of("Azuria"), Some(2020));
    assert_eq!(year_of("Eastonia"), None, "countries without records are excluded");
}

#[then("the ranking is Azuria, Borealia and Castellan")]
fn then_ranking(world: &QueryWorld) {
    assert_eq!(
        names(&world.values.borrow()),
        vec!["Azuria", "Borealia", "Castellan"]
    );
}

#[then("no countries are ranked")]
fn then_none_ranked(world: &QueryWorld) {
    assert!(world.values.borrow().is_empty());
}

#[scenario(path = "tests/features/query_engine.feature", index = 0)]
fn series_newest_first(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_engine.feature", index = 1)]
fn sub_region_comparison(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_engine.feature", index = 2)]
fn averages_omit_empty_sub_regions(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_engine.feature", index = 3)]
fn averages_ascending(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_engine.feature", index = 4)]
fn search_latest_per_country(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_engine.feature", index = 5)]
fn top_three(world: QueryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_engine.feature", index = 6)]
fn empty_ranking(world: QueryWorld) {
    let _ = world;
}
