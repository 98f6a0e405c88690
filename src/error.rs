//! Error types for sheet_price_sync

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for a sync run
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing configuration (credentials, flags, sheet layout)
    #[error("Configuration error: {0}")]
    Config(String),
    /// A required column heading is absent from the header row
    #[error("no \"{0}\" column")]
    MissingColumn(&'static str),
    /// File I/O failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Failed to parse JSON response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// HTTP error status code without a readable error body
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Remote API returned an error object
    #[error("{code}: {details}")]
    ApiResponse { code: String, details: String },
    /// Scryfall has no card with this exact name (and set)
    #[error("Card not found on Scryfall: {name} ({details})")]
    CardNotFound { name: String, details: String },
    /// A rate-limiter wait was abandoned before admission
    #[error("canceled while waiting for rate limiter")]
    RateLimitCanceled,
    /// Another error, annotated with the operation that failed
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with a description of the failed operation.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Adds operation context to fallible results
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(context))
    }
}

/// Result alias for sheet_price_sync operations
pub type Result<T> = std::result::Result<T, Error>;
