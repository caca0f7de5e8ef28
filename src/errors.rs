/*!
 * Error types for the docbatch library.
 *
 * This module contains custom error types for different parts of the library,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Provider errors carry their retry classification in the variant itself.
 * The variant is chosen once, at the transport boundary, from the HTTP status
 * or the connection failure, and the retry controller only ever asks
 * `ProviderError::class()`.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Whether a failed external call is worth repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient failure: rate limits, 5xx, network trouble, anything unknown
    Retryable,
    /// Permanent failure: bad credentials or a malformed request
    NonRetryable,
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails for an unclassified reason
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself with a status we do not single out
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete within the transport timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication or authorization
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider rejected the request as malformed
    #[error("Invalid API request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Build the error variant matching an HTTP status code.
    ///
    /// 401/403 become `AuthenticationError`, the malformed-request family
    /// becomes `InvalidRequest`, 429 becomes `RateLimitExceeded`, 408 becomes
    /// `Timeout`. Everything else (5xx included) stays an `ApiError`.
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            400 | 404 | 405 | 413 | 415 | 422 => Self::InvalidRequest(message),
            408 => Self::Timeout(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Retry classification of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::AuthenticationError(_) | Self::InvalidRequest(_) => ErrorClass::NonRetryable,
            Self::RequestFailed(_)
            | Self::ParseError(_)
            | Self::ApiError { .. }
            | Self::ConnectionError(_)
            | Self::Timeout(_)
            | Self::RateLimitExceeded(_) => ErrorClass::Retryable,
        }
    }

    /// Shorthand for `class() == ErrorClass::Retryable`
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }

    /// The originating HTTP status, when the error came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status_code, .. } => Some(*status_code),
            Self::RateLimitExceeded(_) => Some(429),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors that can occur while loading or saving the translation cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache file exists but could not be read
    #[error("Failed to read cache file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file is not a valid cache document
    #[error("Failed to parse cache file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The cache file was written by an incompatible format version
    #[error("Unsupported cache file version '{version}' in {path:?}")]
    UnsupportedVersion {
        path: PathBuf,
        version: String,
    },

    /// The cache file holds translations for another language pair
    #[error("Cache file {path:?} holds {found} translations, expected {expected}")]
    LanguagePairMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// The in-memory cache could not be serialized
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The cache file could not be written
    #[error("Failed to write cache file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A single unit exhausted its retries and has nothing smaller to fall back to
    #[error("Translation of unit '{unit_id}' failed after retries")]
    UnitFailed {
        /// Identifier of the failed unit
        unit_id: String,
        /// The last error returned by the provider
        #[source]
        source: ProviderError,
    },

    /// Every unit of a degraded batch failed
    #[error("All {} units of a degraded batch failed to translate", .failed_ids.len())]
    AllUnitsFailed {
        /// Identifiers of the failed units, in batch order
        failed_ids: Vec<String>,
        /// The error that made the whole batch fail
        #[source]
        source: ProviderError,
    },

    /// The run was cancelled before this work finished
    #[error("Translation cancelled")]
    Cancelled,

    /// Error loading or saving the cache
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
