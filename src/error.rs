//! # Error Handling
//!
//! This module defines the centralized error type for `policy-sync`. It uses
//! the `thiserror` library to build a single `Error` enum covering every
//! failure the pipeline can surface, each carrying enough context to explain
//! what went wrong without consulting logs.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. The two pipeline-level kinds are
//!   `CommandExecutionFailed` (an external command terminated abnormally) and
//!   `StructuralLoad` (on-disk definitions are malformed, incomplete, or form
//!   a bundle cycle). The remaining variants wrap lower-level failures.
//!
//! - **`TerminationCause`**: Why a command counts as failed: a nonzero exit
//!   code, a terminating signal, or an unknown termination.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Nothing inside the library swallows or retries an error. Every failure is
//! returned to the caller, which owns user-facing reporting.

use thiserror::Error;

/// Why an external command is considered to have failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    /// The process exited normally with a nonzero status code.
    ExitedNonZero { code: i32 },
    /// The process was terminated by a signal.
    KilledBySignal { signal: i32 },
    /// The platform reported neither an exit code nor a signal.
    UnknownTermination,
}

impl std::fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationCause::ExitedNonZero { code } => write!(f, "exited with status {}", code),
            TerminationCause::KilledBySignal { signal } => {
                write!(f, "died with signal {}", signal)
            }
            TerminationCause::UnknownTermination => write!(f, "died of unknown causes"),
        }
    }
}

/// Main error type for policy-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// An external command terminated abnormally.
    ///
    /// Carries the full argv so the failing invocation can be reproduced by
    /// hand.
    #[error("{:?} {cause}", argv.join(" "))]
    CommandExecutionFailed {
        argv: Vec<String>,
        cause: TerminationCause,
    },

    /// An external command could not be started at all.
    #[error("Failed to spawn {:?}: {source}", argv.join(" "))]
    Spawn {
        argv: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    /// On-disk unit or bundle definitions are malformed, missing, or cyclic.
    #[error("Structural load error: {message}")]
    StructuralLoad { message: String },

    /// The local policy repository is unusable before any command runs.
    #[error("Repository error: {message}")]
    Repository { message: String },

    /// An error occurred while parsing the `policy-sync.yaml` configuration file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),
}

impl Error {
    /// Shorthand for building a `StructuralLoad` error.
    pub fn structural(message: impl Into<String>) -> Self {
        Error::StructuralLoad {
            message: message.into(),
        }
    }

    /// The termination cause, if this is a command failure.
    pub fn termination_cause(&self) -> Option<TerminationCause> {
        match self {
            Error::CommandExecutionFailed { cause, .. } => Some(*cause),
            _ => None,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
