use std::time::Duration;

use reqwest::StatusCode;
use shared_utils::env::MissingEnvVarError;
use thiserror::Error;

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Error)]
pub enum ProviderInitError {
    /// A required environment variable (usually a credential) is not set.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    /// An API key contains characters that are not valid in an HTTP header.
    #[error("Invalid API key format: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),

    /// The configured base URL does not parse.
    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// A fixture file could not be read or parsed.
    #[error("Failed to load fixture '{path}': {message}")]
    Fixture { path: String, message: String },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, connection reset).
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider's API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// The request parameters were invalid for this specific provider.
    #[error("Invalid parameters for provider: {0}")]
    Validation(String),

    /// The provider answered, but had no bars for the symbol and range.
    #[error("No data returned for {0}")]
    NoData(String),

    /// The response body did not have the expected shape.
    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The provider did not answer within the allotted time.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// An internal error occurred while processing data within the provider.
    #[error("Internal provider error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Whether repeating the same request has a reasonable chance to succeed.
    ///
    /// Transport failures, timeouts, rate limiting (429) and server errors (5xx)
    /// are transient. Everything else is a property of the request itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Request(e) => match e.status() {
                Some(status) => is_retryable_status(status),
                None => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            },
            ProviderError::Api { status, .. } => is_retryable_status(*status),
            ProviderError::Timeout(_) => true,
            ProviderError::Validation(_)
            | ProviderError::NoData(_)
            | ProviderError::Decode(_)
            | ProviderError::Internal(_) => false,
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
