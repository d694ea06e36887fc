use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use reqwest::{StatusCode, Url};
use std::string::FromUtf8Error;
use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by a transport implementation
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error definition for possible errors in this crate
#[derive(Debug, Error)]
pub enum FetchError {
    /// Returned when the url couldn't be parsed
    #[error("Failed to parse URL: {0}")]
    UrlParse(#[from] url::ParseError),
    /// Returned when the url scheme is neither http nor https
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    /// Returned when a header name is not a valid HTTP header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] InvalidHeaderName),
    /// Returned when a header value contains invalid characters
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
    /// The transport refused to build the request, never retried
    #[error("Failed to build request: {0}")]
    Build(#[source] BoxError),
    /// Every attempt failed at the transport level
    #[error("Request failed after {attempts} attempt(s): {source}")]
    Transport {
        /// Attempts made, including the first one
        attempts: u32,
        /// Error reported by the last attempt
        #[source]
        source: BoxError,
    },
    /// Every attempt returned a status code outside the accepted set
    #[error("Invalid response status code {status} after {attempts} attempt(s)")]
    InvalidStatusCode {
        /// Status of the last response
        status: StatusCode,
        /// Attempts made, including the first one
        attempts: u32,
    },
    /// The server answered 404 while 404 is a definitive status
    #[error("Resource not found: {url}")]
    NotFound {
        url: Url,
        /// Attempts made, the last one being the 404
        attempts: u32,
    },
    /// Reading the response body failed after the headers arrived
    #[error("Read response failed: {0}")]
    Read(#[source] std::io::Error),
    /// A sampling interval that has to be positive was zero
    #[error("Invalid sampling interval: {0:?}")]
    InvalidInterval(Duration),
    /// The async rate meter was started outside of a Tokio runtime
    #[error("No Tokio runtime available to run the rate meter")]
    NoRuntime,
    /// Returned when the config builder rejects its input
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// Failed to spawn the rate meter thread
    #[error("Failed to spawn rate meter thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// The response body is not valid UTF-8
    #[error("UTF8 Error: {0}")]
    Utf8(#[from] FromUtf8Error),
    /// Failed to construct the underlying reqwest client
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
    #[cfg(feature = "json")]
    /// The response body is not the expected JSON
    #[error("Serde error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Status code carried by the error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::InvalidStatusCode { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }
    /// Number of attempts made before giving up, if the request was sent at all
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Transport { attempts, .. }
            | Self::InvalidStatusCode { attempts, .. }
            | Self::NotFound { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<std::convert::Infallible> for FetchError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

/// Failure reported by a [`Transport`][crate::Transport]
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be built, retrying would not help
    #[error("{0}")]
    Build(#[source] BoxError),
    /// Connection, timeout or protocol failure, eligible for retry
    #[error("{0}")]
    Network(#[source] BoxError),
}

impl TransportError {
    pub fn network<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Network(err.into())
    }
    pub fn build<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Build(err.into())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::Build(Box::new(e))
        } else {
            Self::Network(Box::new(e))
        }
    }
}

/// Alias for Result<T, manic_fetch::FetchError>
pub type Result<T> = std::result::Result<T, FetchError>;
