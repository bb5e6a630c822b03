//! Error types for hospnav.
//!
//! This module defines all error types used throughout the hospnav crate,
//! along with the plain-language messages shown to patients and caregivers
//! when an action cannot complete.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for hospnav operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Local Storage Errors ===
    /// Stored JSON for a key could not be decoded.
    #[error("stored data under '{key}' is malformed: {source}")]
    StorageDecode {
        /// Storage key that held the malformed value.
        key: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A write was rejected because the store is full.
    #[error("storage quota exceeded writing '{key}': {needed} bytes needed, {quota} allowed")]
    StorageQuota {
        /// Storage key being written.
        key: String,
        /// Total bytes the store would hold after the write.
        needed: usize,
        /// Configured quota in bytes.
        quota: usize,
    },

    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Record Errors ===
    /// A record failed validation at the store boundary.
    #[error("invalid {field}: {message}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    // === Device Errors ===
    /// The camera or the remote dispenser could not be used.
    #[error("{device} unavailable: {message}")]
    DeviceUnavailable {
        /// Which device failed (`camera`, `dispenser`).
        device: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The remote endpoint could not be reached at all.
    #[error("network unreachable: {0}")]
    Network(String),

    /// A capture workflow action is not valid in the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// The attempted action.
        action: &'static str,
        /// The state the session was in.
        state: &'static str,
    },

    /// Medication recognition could not produce a result.
    #[error("recognition failed: {0}")]
    Recognition(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An HTTP request failed for a reason other than connectivity.
    #[error("HTTP error: {0}")]
    Http(String),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for hospnav operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Network(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a new device unavailable error.
    #[must_use]
    pub fn device_unavailable(device: &'static str, message: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            device,
            message: message.into(),
        }
    }

    /// Create a new recognition error.
    #[must_use]
    pub fn recognition(message: impl Into<String>) -> Self {
        Self::Recognition(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the remote side was never reached.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Check if this error is a storage quota rejection.
    #[must_use]
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::StorageQuota { .. })
    }

    /// The message to show the user for this error.
    ///
    /// Every error is handled where it happens and turned into one of these
    /// messages; none of them should take the screen down.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::StorageQuota { .. } => "Could not save, please try again.".to_string(),
            Self::StorageDecode { .. } => {
                "Saved information could not be read and was reset.".to_string()
            }
            Self::DeviceUnavailable { device, .. } => {
                format!("The {device} is not available right now. Please try again later.")
            }
            Self::Network(_) => {
                "Network unreachable. Please check your connection and try again.".to_string()
            }
            Self::Validation { field, message } => format!("Please check {field}: {message}."),
            Self::InvalidTransition { .. } => "That step is not available right now.".to_string(),
            Self::Recognition(_) => {
                "The medication could not be recognised. Please retake the photo.".to_string()
            }
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => {
                format!("Settings problem: {self}")
            }
            Self::Http(_) | Self::Json(_) => {
                "The request failed. Please try again later.".to_string()
            }
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::DatabaseMigration { .. }
            | Self::Io(_)
            | Self::DirectoryCreate { .. }
            | Self::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}
