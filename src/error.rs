//! Error types.
//!
//! [`ServiceError`] is what an external lookup returns when it fails. Most of
//! those failures are absorbed where they happen (the item or field is left
//! out). Only the lookups a trip cannot proceed without surface as a
//! [`PlanError`].

use std::time::Duration;
use serde::Serialize;

/// Failure of a single call to an external service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("upstream status {0}")]
    Upstream(String),
    #[error("no results for '{0}'")]
    NoResults(String),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("no API key configured for {0}")]
    MissingCredential(&'static str),
}

/// Failure of a whole trip request.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("missing required input: {0}")]
    MissingInput(&'static str),
    #[error("could not geocode '{address}': {source}")]
    Geocoding {
        address: String,
        #[source]
        source: ServiceError,
    },
    #[error("could not compute a route: {0}")]
    Routing(#[source] ServiceError),
}

impl PlanError {
    /// HTTP-style status for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            PlanError::MissingInput(_) => 400,
            PlanError::Geocoding { .. } | PlanError::Routing(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            status: self.status_code(),
        }
    }
}

/// Serializable error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
}
