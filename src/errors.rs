/*!
 * Error types for the phasewai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
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

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the failure is transient and the request may be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors that can occur while decoding or parsing caption files
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// None of the supported text encodings could decode the input
    #[error("Could not decode {source_name} with any supported encoding")]
    DecodeFailure {
        /// File name or other label of the undecodable input
        source_name: String,
    },

    /// Caption indices must be strictly ascending
    #[error("Subtitle index {current} does not follow {previous} in ascending order")]
    NonAscendingIndex {
        /// Index of the preceding record
        previous: usize,
        /// Offending index
        current: usize,
    },
}

/// Errors that abort a translation run.
///
/// Batch positions are stored zero-based and displayed one-based.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The service answered, but not with a well-formed list of index/text pairs
    #[error("Batch {} returned an invalid response: {reason}", .batch + 1)]
    ResponseValidation {
        /// Position of the failing batch
        batch: usize,
        /// What was wrong with the payload
        reason: String,
    },

    /// The service call itself failed
    #[error("Batch {} failed to reach the translation service: {source}", .batch + 1)]
    ServiceInvocation {
        /// Position of the failing batch
        batch: usize,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// Strict coverage: the batch left indices untranslated
    #[error("Batch {} left subtitles untranslated: {indices:?}", .batch + 1)]
    MissingIndices {
        /// Position of the failing batch
        batch: usize,
        /// Indices with no translation after the batch was merged
        indices: Vec<usize>,
    },

    /// Strict validation: the response mentioned indices outside the batch
    #[error("Batch {} returned indices outside the batch: {indices:?}", .batch + 1)]
    ForeignIndices {
        /// Position of the failing batch
        batch: usize,
        /// Indices not submitted in the batch
        indices: Vec<usize>,
    },
}

impl TranslationError {
    /// Zero-based position of the batch that failed
    pub fn batch(&self) -> usize {
        match self {
            Self::ResponseValidation { batch, .. }
            | Self::ServiceInvocation { batch, .. }
            | Self::MissingIndices { batch, .. }
            | Self::ForeignIndices { batch, .. } => *batch,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

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
