//! Error types for tfmodule-schema.
//!
//! This module defines the error hierarchy using `thiserror`. Every
//! variant records where in this crate it was raised so that log lines
//! and the binary's error output point at the failing call site.
//!
//! # Error Categories
//!
//! - **Configuration errors**: missing credential, bad arguments, invalid config
//!   files. These are fatal and no output file is written.
//! - **Source resolution errors**: missing directories, registry failures,
//!   clone failures. The orchestrator degrades these to the empty schema.
//! - **Inference errors**: request too large, other model failures, empty or
//!   malformed completions. Also degraded to the empty schema.
//!
//! # Example
//!
//! ```rust
//! use tfmodule_schema::error::{SchemaError, Result};
//!
//! fn read_module_file(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .map_err(|e| SchemaError::io(path, e, file!(), line!()))
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(ConfigMissing { key: "OPENAI_KEY".to_string() }));
///
/// // Field init shorthand works too
/// let message = "context_length_exceeded".to_string();
/// return Err(err!(ContextLengthExceeded { message }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident $(: $value:expr)?),* $(,)? }) => {
        $crate::error::SchemaError::$variant {
            $($field $(: $value)?,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for tfmodule-schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// The main error type for tfmodule-schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Directory not found.
    #[error("Directory not found: {path} ({src_path}:{src_line})")]
    DirectoryNotFound {
        /// The missing directory path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// An entry below a module directory could not be read.
    #[error("Failed to walk {path}: {message} ({src_path}:{src_line})")]
    DirectoryWalk {
        /// The entry that failed
        path: PathBuf,
        /// walkdir's description, e.g. a symlink loop
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Registry and Git Errors
    // =========================================================================
    /// HTTP request error.
    #[error("HTTP request failed ({src_path}:{src_line}): {message}")]
    Http {
        /// Error message
        message: String,
        /// HTTP status code (if available)
        status_code: Option<u16>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Registry metadata did not name a source repository.
    #[error("No source repository in registry metadata for '{module_source}' ({src_path}:{src_line})")]
    MissingModuleSource {
        /// The registry coordinate that was looked up
        module_source: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Git clone error.
    #[error("Failed to clone repository '{url}' ({src_path}:{src_line}): {message}")]
    GitClone {
        /// The repository URL
        url: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// A required environment variable is unset or empty.
    #[error("Missing required configuration: set the {key} environment variable ({src_path}:{src_line})")]
    ConfigMissing {
        /// Name of the environment variable
        key: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Wrong number of positional arguments.
    #[error("{message}\nUsage: infer-tfmodule-schema <module_source> [<module_version>] <output_file_name>")]
    InvalidArguments {
        /// What was wrong with the arguments
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Inference Errors
    // =========================================================================
    /// The conversation exceeded the model's context window.
    #[error("Inference request too large ({src_path}:{src_line}): {message}")]
    ContextLengthExceeded {
        /// Failure message reported by the model service
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Any other inference failure.
    #[error("Inference failed ({src_path}:{src_line}): {message}")]
    Inference {
        /// Failure message reported by the model service
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The model returned no content.
    #[error("No completion received from model ({src_path}:{src_line})")]
    EmptyCompletion {
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// The model's content was not the expected structured document.
    #[error("Malformed model response ({src_path}:{src_line}): {message}")]
    MalformedResponse {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Internal error (should not happen in normal operation).
    #[error("Internal error ({src_path}:{src_line}): {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },
}

impl SchemaError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error, src_path: &'static str, src_line: u32) -> Self {
        Self::Io { path: path.into(), source, src_path, src_line }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::ConfigParse { message, src_path, src_line }
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::Internal { message, src_path, src_line }
    }

    /// Whether the model rejected the request because the input was too large.
    ///
    /// This is the only failure the degraded retry reacts to.
    #[must_use]
    pub const fn is_request_too_large(&self) -> bool {
        matches!(self, Self::ContextLengthExceeded { .. })
    }

    /// Whether the error is a configuration problem that stops the run
    /// before any output file is written.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigMissing { .. } | Self::InvalidArguments { .. }
        )
    }

    /// Returns the appropriate exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArguments { .. } => 2,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::ConfigParse { .. } => 18,
            Self::ConfigMissing { .. } => 20,
            _ => 1,
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(source: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization/deserialization error: {source}"),
            src_path: file!(),
            src_line: line!(),
        }
    }
}
