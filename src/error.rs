// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the trial tracking library.

use std::fmt;

/// Result type alias for tracking operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Library error types.
#[derive(Debug)]
pub enum Error {
    /// A value's runtime kind has no encoding rule
    UnsupportedType(String),
    /// A `__type__` tag has no matching decoder
    UnknownDiscriminator(String),
    /// No record matches the given trial identifier
    NotFound(String),
    /// The storage substrate reported a non-success status
    Storage {
        /// HTTP status code, when the substrate reported one
        status: Option<u16>,
        /// Raw response body or transport error text
        message: String,
    },
    /// Configuration error
    Config(String),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedType(kind) => write!(f, "Unsupported value type: {}", kind),
            Error::UnknownDiscriminator(tag) => {
                write!(f, "Unknown __type__ discriminator: {}", tag)
            }
            Error::NotFound(id) => write!(f, "Trial not found: {}", id),
            Error::Storage { status, message } => match status {
                Some(code) => write!(f, "Storage backend error ({}): {}", code, message),
                None => write!(f, "Storage backend error: {}", message),
            },
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Storage {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}
