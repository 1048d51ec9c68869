//! SQLite-backed engine handle.
//!
//! [`SqliteIndicatorStore`] holds only its [`StoreConfig`]. Each engine call
//! opens a fresh connection with foreign keys and the busy timeout applied,
//! so handles can be cloned freely and shared between threads.
//!
//! Only [`SqliteIndicatorStore::create`] may create the database file. Every
//! other connection opens an existing file and fails if it has gone.

use camino::Utf8PathBuf;
use log::{debug, info};
use rusqlite::{
    Connection, Error as SqliteError, ErrorCode, OpenFlags, ffi, functions::FunctionFlags,
};
use srb_core::{EngineError, Ratio, Year};
use thiserror::Error;

use crate::{
    StoreConfig,
    fs::ensure_parent_dir,
    schema::{SchemaError, initialise_schema, verify_schema},
};

/// Errors raised while creating or opening an SRB database.
#[derive(Debug, Error)]
pub enum StoreOpenError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path whose parent could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The schema could not be created or did not match.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Query and mutation engine over an SRB SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteIndicatorStore {
    config: StoreConfig,
}

impl SqliteIndicatorStore {
    /// Create the database if needed and initialise its schema.
    ///
    /// Parent directories are created automatically.
    ///
    /// # Errors
    /// Returns [`StoreOpenError`] when the directory, database or schema
    /// cannot be prepared.
    pub fn create(config: StoreConfig) -> Result<Self, StoreOpenError> {
        let path = config.database();
        ensure_parent_dir(path).map_err(|source| StoreOpenError::CreateDirectory {
            path: path.to_path_buf(),
            source,
        })?;
        let mut connection = open_raw(&config, OpenFlags::default())?;
        initialise_schema(&mut connection)?;
        info!("initialised SRB schema at {path}");
        Ok(Self { config })
    }

    /// Open an existing, initialised database.
    ///
    /// # Errors
    /// Returns [`StoreOpenError::Open`] when the file does not exist and
    /// [`StoreOpenError::Schema`] when the database was never initialised or
    /// holds another schema version.
    pub fn open(config: StoreConfig) -> Result<Self, StoreOpenError> {
        let connection = open_raw(&config, existing_only())?;
        verify_schema(&connection)?;
        debug!("opened SRB database at {}", config.database());
        Ok(Self { config })
    }

    /// Settings this handle connects with.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open a connection for one engine operation.
    pub(crate) fn connect(&self) -> Result<Connection, EngineError> {
        open_raw(&self.config, existing_only())
            .map_err(|error| EngineError::store("open database", error))
    }
}

/// Default flags without `SQLITE_OPEN_CREATE`.
fn existing_only() -> OpenFlags {
    let mut flags = OpenFlags::default();
    flags.remove(OpenFlags::SQLITE_OPEN_CREATE);
    flags
}

fn open_raw(config: &StoreConfig, flags: OpenFlags) -> Result<Connection, StoreOpenError> {
    let path = config.database();
    let open_error = |source| StoreOpenError::Open {
        path: path.to_path_buf(),
        source,
    };
    let connection = Connection::open_with_flags(path.as_std_path(), flags).map_err(open_error)?;
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(open_error)?;
    connection
        .busy_timeout(config.busy_timeout())
        .map_err(open_error)?;
    register_fold_function(&connection).map_err(open_error)?;
    Ok(connection)
}

/// Fold `text` to lower case across the whole of Unicode.
///
/// SQLite's own `LIKE` and `lower()` only fold ASCII letters.
fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Register `srb_fold(text)`, the SQL face of [`fold_case`].
fn register_fold_function(connection: &Connection) -> rusqlite::Result<()> {
    connection.create_scalar_function(
        "srb_fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let text = context.get::<String>(0)?;
            Ok(fold_case(&text))
        },
    )
}

/// Convert a stored REAL back into a validated [`Ratio`].
pub(crate) fn decode_ratio(raw: f64) -> Result<Ratio, EngineError> {
    Ratio::new(raw).map_err(|error| EngineError::store("decode stored ratio", error))
}

/// Convert a collected list of stored years.
pub(crate) fn decode_years(raw: Vec<i32>) -> Vec<Year> {
    raw.into_iter().map(Year::new).collect()
}

/// Map a failed indicator write to the engine taxonomy.
///
/// Key collisions become [`EngineError::Conflict`], a missing country becomes
/// [`EngineError::NotFound`] and a rejected value becomes
/// [`EngineError::InvalidInput`]. Everything else is a store failure.
pub(crate) fn classify_write_error(
    operation: &'static str,
    country: &str,
    key: String,
    error: SqliteError,
) -> EngineError {
    let SqliteError::SqliteFailure(failure, _) = &error else {
        return EngineError::store(operation, error);
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return EngineError::store(operation, error);
    }
    match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
            EngineError::Conflict {
                entity: "indicator record",
                key,
            }
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => EngineError::NotFound {
            entity: "country",
            key: country.to_owned(),
        },
        ffi::SQLITE_CONSTRAINT_CHECK => {
            EngineError::invalid_input("value", "rejected by the store's value constraint")
        }
        _ => EngineError::store(operation, error),
    }
}
