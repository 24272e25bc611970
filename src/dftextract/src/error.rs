//! Error taxonomy
//!
//! Two levels:
//! - [`Error`] aborts a whole directory (detection failed, filesystem broke).
//! - [`FieldError`] is local to one property; the driver records it and moves
//!   on to the next capability entry. The one exception is
//!   [`FieldError::Io`], which the driver escalates to [`Error::Io`].

use crate::property::Property;
use std::path::PathBuf;
use thiserror::Error;

/// Directory-level failures
#[derive(Error, Debug)]
pub enum Error {
    #[error("No backend recognises {}", .directory.display())]
    NoMatchingBackend { directory: PathBuf },

    #[error("Several backends recognise {}: {}", .directory.display(), .candidates.join(", "))]
    AmbiguousBackend {
        directory: PathBuf,
        candidates: Vec<&'static str>,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Property-level failures
#[derive(Error, Debug)]
pub enum FieldError {
    /// A marker expected in a present, readable file was not found
    #[error("'{marker}' not found in {file}")]
    MissingField { file: String, marker: String },

    /// The marker was found but the value next to it could not be read
    #[error("Invalid value for '{marker}' in {file}: {value}")]
    InvalidValue {
        file: String,
        marker: String,
        value: String,
    },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FieldError {
    pub fn missing(file: impl Into<String>, marker: impl Into<String>) -> Self {
        Self::MissingField {
            file: file.into(),
            marker: marker.into(),
        }
    }

    pub fn invalid(
        file: impl Into<String>,
        marker: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            file: file.into(),
            marker: marker.into(),
            value: value.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The directory-level error for an I/O failure; integrity failures
    /// come back unchanged
    pub(crate) fn into_io(self) -> std::result::Result<Error, Self> {
        match self {
            Self::Io { path, source } => Ok(Error::Io { path, source }),
            other => Err(other),
        }
    }
}

/// Successful outcome of one extractor
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Found(Property),
    /// The property has no meaning for this run
    NotApplicable,
}

impl From<Property> for Outcome {
    fn from(property: Property) -> Self {
        Self::Found(property)
    }
}

impl From<Option<Property>> for Outcome {
    fn from(property: Option<Property>) -> Self {
        property.map_or(Self::NotApplicable, Self::Found)
    }
}

/// What every extractor returns
pub type Extraction = std::result::Result<Outcome, FieldError>;
