//! Error types for area construction and update handling

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the authoritative area model
#[derive(Debug, Error, PartialEq)]
pub enum AreaError {
    /// Malformed static layout input; the area must not be built
    #[error("malformed area {name}: {reason}")]
    Configuration { name: String, reason: String },

    /// An update that cannot be applied to the targeted area
    #[error("update rejected for area {area_id}: {reason}")]
    InvariantViolation { area_id: String, reason: String },
}

impl AreaError {
    pub fn configuration(name: impl Into<String>, reason: impl Into<String>) -> Self {
        AreaError::Configuration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invariant(area_id: impl Into<String>, reason: impl Into<String>) -> Self {
        AreaError::InvariantViolation {
            area_id: area_id.into(),
            reason: reason.into(),
        }
    }
}

/// Errors while loading a map layout from disk
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse layout file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Area(#[from] AreaError),
}
