use thiserror::Error;

/// Unified error type for the token-icons library.
///
/// Only raised before any I/O starts: icon resolution itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// A source could not answer: network failure, bad status, or malformed body.
///
/// Distinct from a miss (`Ok(None)`), which is a valid "not found" answer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("request timed out")]
    Timeout,
}
