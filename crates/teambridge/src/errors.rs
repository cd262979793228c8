use thiserror::Error;

/// Local validation failures raised by the pure conversion functions.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Failures at the remote platform boundary.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A required field was missing before the request was issued
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Request failed: {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote platform answered with a payload of the wrong shape
    #[error("Protocol violation: {0}")]
    Protocol(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
