//! Structured error types for the fetch pipeline.
//!
//! Contract violations and malformed payloads are errors. A provider that is
//! unreachable or has nothing to return is not: that is reported through
//! [`FetchOutcome`](super::fetcher::FetchOutcome).

use polars::prelude::PolarsError;
use thiserror::Error;

/// Failure to turn caller input into query parameters.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unparseable date '{input}': expected YYYY-MM-DD, YYYY-MM-DD HH:MM:SS or RFC 3339")]
    InvalidDate { input: String },

    #[error("date out of representable range: {0}")]
    OutOfRange(String),
}

/// Failure below the HTTP status line: no response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Hard failures of a single fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("interval must be one of '1d', '1wk', '1mo', or '1m' (got '{interval}')")]
    InvalidInterval { interval: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("response format changed for {symbol}: {detail}")]
    MalformedResponse { symbol: String, detail: String },

    #[error("table construction failed: {0}")]
    Table(#[from] PolarsError),
}

/// A [`FetchConfig`](super::config::FetchConfig) that fails validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid fetch config: {0}")]
    Invalid(String),
}
