use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Version recorded in `srb_schema_version` by [`initialise_schema`].
pub const SCHEMA_VERSION: i64 = 1;

/// Initialise the SRB schema inside an existing SQLite database.
///
/// The function enables foreign keys, creates the hierarchy and indicator
/// tables with their indexes, and records the schema version. Existing
/// installations must already match the expected version; mismatches are
/// rejected so migrations can be applied explicitly. Running it twice is a
/// no-op.
///
/// # Errors
/// Returns [`SchemaError`] when a migration step fails or the stored version
/// differs from [`SCHEMA_VERSION`].
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use srb_store::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create SRB schema");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM srb_schema_version LIMIT 1", [], |row| {
///         row.get(0)
///     })
///     .expect("read schema version");
/// assert_eq!(version, 1);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| SchemaError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| SchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_hierarchy_tables(&transaction)?;
    create_indicator_table(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

/// Check that `connection` holds an initialised schema of the expected version.
///
/// # Errors
/// Returns [`SchemaError::Uninitialised`] when the version table is missing or
/// empty, and [`SchemaError::VersionMismatch`] for any other version.
pub(crate) fn verify_schema(connection: &Connection) -> Result<(), SchemaError> {
    let table: Option<String> = connection
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'srb_schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "look up schema version table",
            source,
        })?;
    if table.is_none() {
        return Err(SchemaError::Uninitialised);
    }

    match read_schema_version(connection)? {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => Err(SchemaError::Uninitialised),
    }
}

fn create_hierarchy_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create regions",
        "CREATE TABLE IF NOT EXISTS regions (
            code TEXT PRIMARY KEY CHECK (length(trim(code)) > 0),
            name TEXT NOT NULL
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create sub_regions",
        "CREATE TABLE IF NOT EXISTS sub_regions (
            code TEXT PRIMARY KEY CHECK (length(trim(code)) > 0),
            name TEXT NOT NULL,
            region_code TEXT NOT NULL,
            FOREIGN KEY (region_code) REFERENCES regions(code)
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create countries",
        "CREATE TABLE IF NOT EXISTS countries (
            code TEXT PRIMARY KEY CHECK (length(trim(code)) > 0),
            name TEXT NOT NULL,
            sub_region_code TEXT NOT NULL,
            FOREIGN KEY (sub_region_code) REFERENCES sub_regions(code)
        ) WITHOUT ROWID",
    )
}

fn create_indicator_table(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create indicator_records",
        "CREATE TABLE IF NOT EXISTS indicator_records (
            country_code TEXT NOT NULL,
            year INTEGER NOT NULL,
            value REAL NOT NULL CHECK (value > 0),
            PRIMARY KEY (country_code, year),
            FOREIGN KEY (country_code) REFERENCES countries(code)
        ) WITHOUT ROWID",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "index indicator_records by year",
        "CREATE INDEX IF NOT EXISTS idx_indicator_records_year
            ON indicator_records(year, value)",
    )?;
    run_migration_step(
        transaction,
        "index countries by sub-region",
        "CREATE INDEX IF NOT EXISTS idx_countries_sub_region
            ON countries(sub_region_code, name)",
    )?;
    run_migration_step(
        transaction,
        "index sub_regions by region",
        "CREATE INDEX IF NOT EXISTS idx_sub_regions_region
            ON sub_regions(region_code, name)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS srb_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    match read_schema_version(transaction)? {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO srb_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| SchemaError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn read_schema_version(connection: &Connection) -> Result<Option<i64>, SchemaError> {
    connection
        .query_row(
            "SELECT version FROM srb_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError::Migration { step, source })
}

/// Errors raised when initialising or verifying the SRB schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Foreign key enforcement could not be enabled.
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        /// Underlying `SQLite` error.
        #[source]
        source: SqliteError,
    },
    /// A DDL or bookkeeping statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Migration step that failed.
        step: &'static str,
        /// Underlying `SQLite` error.
        #[source]
        source: SqliteError,
    },
    /// The database holds a different schema version.
    #[error("expected SRB schema version {expected} but found {found}; apply migrations before retrying")]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version found in the database.
        found: i64,
    },
    /// The database has never been initialised.
    #[error("database has no SRB schema; run `srb init` first")]
    Uninitialised,
}
