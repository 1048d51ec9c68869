//! Connection settings for the SQLite store.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};

/// Location and connection tuning of an SRB database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    database: Utf8PathBuf,
    busy_timeout: Duration,
}

impl StoreConfig {
    /// Default time a connection waits on a locked database.
    pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

    /// Settings for the database at `database` with default tuning.
    #[must_use]
    pub fn new(database: impl Into<Utf8PathBuf>) -> Self {
        Self {
            database: database.into(),
            busy_timeout: Self::DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Override how long a connection waits on a locked database.
    #[must_use]
    pub const fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Path of the SQLite database file.
    #[must_use]
    pub fn database(&self) -> &Utf8Path {
        &self.database
    }

    /// Busy timeout applied to every connection.
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}
