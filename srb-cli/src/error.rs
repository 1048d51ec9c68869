//! Error types emitted by the SRB CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use srb_core::EngineError;
use srb_store::{DatasetError, StoreOpenError};
use thiserror::Error;

/// Errors emitted by the SRB CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Name of the missing flag.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// The database could not be created or opened.
    #[error(transparent)]
    OpenStore(#[from] StoreOpenError),
    /// A dataset could not be read or provisioned.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// An engine operation failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Serialising a result table to JSON failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the result to the output stream failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

impl CliError {
    /// Stable category printed before the error message.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::ArgumentParsing(_) | Self::MissingArgument { .. } => "usage",
            Self::Configuration(_) => "configuration",
            Self::Engine(error) => error.kind().label(),
            Self::Dataset(DatasetError::Rejected { source, .. }) => source.kind().label(),
            Self::Dataset(_) => "dataset",
            Self::OpenStore(_) => "store-error",
            Self::SerialiseOutput(_) | Self::WriteOutput(_) => "output",
        }
    }
}
