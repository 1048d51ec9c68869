//! Command-line interface over the SRB reporting and mutation engine.
#![forbid(unsafe_code)]

use std::{io::Write, time::Duration};

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use srb_core::{
    CatalogQueries, CountryCode, IndicatorMutations, IndicatorQueries, MutationOutcome, Ratio,
    RegionCode, ResultShaper, ShapedTable, SubRegionCode, TopLimit, Year, YearRange,
};
use srb_store::{SqliteIndicatorStore, StoreConfig, load_dataset};

mod error;
mod render;

pub use error::CliError;
use render::{OutputFormat, write_table};

const ARG_DATABASE: &str = "database";
const ARG_BUSY_TIMEOUT_MS: &str = "busy-timeout-ms";
const ENV_DATABASE: &str = "SRB_CMDS_STORE_DATABASE";

/// Run the SRB CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments, configuration, the store or the
/// requested operation fail.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let config = cli.store.into_config()?;
    let mut stdout = std::io::stdout().lock();
    run_with(cli.command, &config, cli.json, &mut stdout)
}

/// Execute `command` against the database described by `config`.
fn run_with(
    command: Command,
    config: &StoreConfig,
    json: bool,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let table = execute(command, config)?;
    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    write_table(writer, &table, format)
}

#[derive(Debug, Parser)]
#[command(
    name = "srb",
    about = "Report on and maintain the sex ratio at birth indicator",
    version
)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    /// Emit result tables as JSON instead of aligned text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

/// Options locating the SRB database.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "store")]
#[ortho_config(prefix = "SRB")]
struct StoreArgs {
    /// Path to the SQLite database file.
    #[arg(long = ARG_DATABASE, value_name = "path", global = true)]
    #[serde(default)]
    database: Option<Utf8PathBuf>,
    /// Milliseconds to wait on a locked database before failing.
    #[arg(long = ARG_BUSY_TIMEOUT_MS, value_name = "ms", global = true)]
    #[serde(default)]
    busy_timeout_ms: Option<u64>,
}

impl StoreArgs {
    fn into_config(self) -> Result<StoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        StoreConfig::try_from(merged)
    }
}

impl TryFrom<StoreArgs> for StoreConfig {
    type Error = CliError;

    fn try_from(args: StoreArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_DATABASE,
        })?;
        let config = Self::new(database);
        Ok(match args.busy_timeout_ms {
            Some(millis) => config.with_busy_timeout(Duration::from_millis(millis)),
            None => config,
        })
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database schema, optionally loading a JSON dataset.
    Init(InitArgs),
    #[command(flatten)]
    Engine(EngineCommand),
}

/// Commands that run against an initialised database.
#[derive(Debug, Subcommand)]
enum EngineCommand {
    /// Show a country's values, newest year first.
    Series {
        /// Country code.
        country: String,
    },
    /// Compare the countries of a sub-region in one year.
    SubRegion {
        /// Sub-region code.
        sub_region: String,
        /// Year to compare.
        year: i32,
    },
    /// Average each sub-region of a region in one year.
    Region {
        /// Region code.
        region: String,
        /// Year to average.
        year: i32,
    },
    /// Show the latest value of every country whose name contains a keyword.
    Search {
        /// Case-insensitive substring of the country name.
        keyword: String,
    },
    /// Rank the highest values recorded in a year.
    Top {
        /// Year to rank.
        year: i32,
        /// Number of countries to show.
        #[arg(long, default_value_t = TopLimit::DEFAULT.get())]
        limit: u32,
    },
    /// Add the year after a country's latest record.
    Append {
        /// Country code.
        country: String,
        /// Value to record; defaults to the latest value.
        #[arg(long)]
        value: Option<f64>,
    },
    /// Change the value of an existing record.
    Update {
        /// Country code.
        country: String,
        /// Year of the record.
        year: i32,
        /// New value.
        value: f64,
    },
    /// Delete a country's records between two years, inclusive.
    Delete {
        /// Country code.
        country: String,
        /// First year to delete.
        start: i32,
        /// Last year to delete.
        end: i32,
    },
    /// List reference data for selection menus.
    List {
        /// Catalogue to list.
        catalog: Catalog,
        /// Restrict `years` to one country.
        #[arg(long)]
        country: Option<String>,
    },
}

#[derive(Debug, Args)]
struct InitArgs {
    /// JSON dataset to provision after creating the schema.
    #[arg(long, value_name = "path")]
    dataset: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Catalog {
    Regions,
    SubRegions,
    Countries,
    Years,
}

fn execute(command: Command, config: &StoreConfig) -> Result<ShapedTable, CliError> {
    debug!("executing {command:?}");
    match command {
        Command::Init(args) => initialise(args, config),
        Command::Engine(engine) => {
            let store = SqliteIndicatorStore::open(config.clone())?;
            dispatch(engine, &store, &ResultShaper::default())
        }
    }
}

fn dispatch(
    command: EngineCommand,
    store: &SqliteIndicatorStore,
    shaper: &ResultShaper,
) -> Result<ShapedTable, CliError> {
    let table = match command {
        EngineCommand::Series { country } => {
            shaper.shape(&store.series(&CountryCode::new(country)?)?)
        }
        EngineCommand::SubRegion { sub_region, year } => shaper.shape(
            &store.sub_region_year(&SubRegionCode::new(sub_region)?, Year::new(year))?,
        ),
        EngineCommand::Region { region, year } => shaper.shape(
            &store.region_year_averages(&RegionCode::new(region)?, Year::new(year))?,
        ),
        EngineCommand::Search { keyword } => shaper.shape(&store.search_latest(&keyword)?),
        EngineCommand::Top { year, limit } => {
            shaper.shape_ranked(&store.top_n(Year::new(year), TopLimit::new(limit)?)?)
        }
        EngineCommand::Append { country, value } => {
            let supplied = value.map(Ratio::new).transpose()?;
            let record = store.append_next_year(&CountryCode::new(country)?, supplied)?;
            shaper.shape_outcome(&MutationOutcome::Appended(record))
        }
        EngineCommand::Update {
            country,
            year,
            value,
        } => {
            let record = store.update_value(
                &CountryCode::new(country)?,
                Year::new(year),
                Ratio::new(value)?,
            )?;
            shaper.shape_outcome(&MutationOutcome::Updated(record))
        }
        EngineCommand::Delete {
            country,
            start,
            end,
        } => {
            let target = CountryCode::new(country)?;
            let range = YearRange::new(Year::new(start), Year::new(end))?;
            let count = store.delete_range(&target, range)?;
            shaper.shape_outcome(&MutationOutcome::Deleted {
                country: target,
                range,
                count,
            })
        }
        EngineCommand::List { catalog, country } => list(store, shaper, catalog, country)?,
    };
    Ok(table)
}

fn initialise(args: InitArgs, config: &StoreConfig) -> Result<ShapedTable, CliError> {
    let store = SqliteIndicatorStore::create(config.clone())?;
    let mut rows = vec![vec![
        "database".to_owned(),
        config.database().to_string(),
    ]];
    if let Some(path) = args.dataset {
        let dataset = load_dataset(&path)?;
        let summary = store.provision(&dataset)?;
        rows.extend([
            vec!["regions".to_owned(), summary.regions.to_string()],
            vec!["sub-regions".to_owned(), summary.sub_regions.to_string()],
            vec!["countries".to_owned(), summary.countries.to_string()],
            vec!["records".to_owned(), summary.records.to_string()],
        ]);
    }
    Ok(ShapedTable {
        title: "Initialised database".to_owned(),
        columns: vec!["Item".to_owned(), "Value".to_owned()],
        rows,
    })
}

fn list(
    store: &SqliteIndicatorStore,
    shaper: &ResultShaper,
    catalog: Catalog,
    country: Option<String>,
) -> Result<ShapedTable, CliError> {
    let table = match (catalog, country) {
        (Catalog::Years, Some(code)) => {
            let target = CountryCode::new(code)?;
            let years = store.list_country_years(&target)?;
            shaper.shape(&years).titled(format!("Years recorded for {target}"))
        }
        (Catalog::Years, None) => shaper.shape(&store.list_years()?),
        (Catalog::Regions, _) => shaper.shape(&store.list_regions()?).titled("Regions"),
        (Catalog::SubRegions, _) => shaper.shape(&store.list_sub_regions()?).titled("Sub-regions"),
        (Catalog::Countries, _) => shaper.shape(&store.list_countries()?).titled("Countries"),
    };
    Ok(table)
}

#[cfg(test)]
mod tests;
