//! Error types for kubefetch startup and run orchestration.
//!
//! These errors stop the whole run before any component is processed
//! (bad configuration, unusable directories). Component-scoped failures live
//! in [`crate::pipeline::PipelineError`] and never abort the run.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that prevent a run from starting or completing its report.
#[derive(Debug, Error)]
pub enum KubefetchError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {reason}")]
    ConfigRead {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid config file {path}: {reason}")]
    ConfigParse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// The forward proxy URL could not be parsed.
    #[error("invalid proxy URL {url}: {reason}")]
    InvalidProxy {
        /// The rejected proxy URL.
        url: String,
        /// Description of the parse error.
        reason: String,
    },

    /// A requested component is not in the registry.
    #[error("unknown component {name}; expected one of: {expected}")]
    UnknownComponent {
        /// The rejected component identifier.
        name: String,
        /// Comma-separated list of known identifiers.
        expected: String,
    },

    /// The output or staging directory could not be prepared.
    #[error("directory {path} is not usable: {reason}")]
    DirectoryUnavailable {
        /// Path of the directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// One or more components failed and strict mode is enabled.
    #[error("{failed} component(s) failed")]
    ComponentsFailed {
        /// Number of failed components.
        failed: usize,
    },

    /// Failed to write the run report.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`KubefetchError`].
pub type Result<T> = std::result::Result<T, KubefetchError>;
