//! Error types for the analytics client

use thiserror::Error;

/// Errors that can occur when using the analytics client
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A caller-supplied value was rejected before any request was made
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The login exchange did not produce an auth token
    #[error("Authentication failed: {reason}")]
    Authentication {
        /// What went wrong
        reason: String,
        /// Underlying transport error, if any
        #[source]
        source: Option<reqwest::Error>,
    },

    /// An authenticated request returned no usable content
    #[error("API request failed: {reason}")]
    Api {
        /// What went wrong
        reason: String,
        /// Underlying transport error, if any
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Response body is not well-formed XML
    #[error("Failed to parse XML response: {0}")]
    Parse(#[from] roxmltree::Error),

    /// Client initialization failed
    #[error("Client initialization failed: {0}")]
    ClientInit(String),
}

impl AnalyticsError {
    pub(crate) fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn api(reason: impl Into<String>) -> Self {
        Self::Api {
            reason: reason.into(),
            source: None,
        }
    }

    /// Whether the underlying transport error was a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Authentication {
                source: Some(e), ..
            }
            | Self::Api {
                source: Some(e), ..
            } => e.is_timeout(),
            _ => false,
        }
    }
}
