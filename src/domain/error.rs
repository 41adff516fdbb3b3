//! Error taxonomy for data-fetch operations.
//!
//! Every query and mutation in the crate resolves to `Result<T, ErrorKind>`
//! so callers pattern-match one uniform failure shape instead of branching
//! on ad hoc per-endpoint states. The type is `Clone` because a de-duplicated
//! in-flight fetch fans its outcome out to every waiting caller.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("network error: {0}")]
    Network(String),
    /// The server answered 401; the session has been cleared.
    #[error("authentication required")]
    Unauthorized,
    /// A 4xx other than 401, carrying the server's message payload for the
    /// initiating form to surface.
    #[error("request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
    /// A 5xx; the caller renders a generic failed-to-load/save state.
    #[error("server error (status {status})")]
    Server { status: u16 },
    /// The response arrived but its body did not match the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(String),
    /// The request could not be constructed (bad path or header value).
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl ErrorKind {
    /// True for failures a user-initiated retry could plausibly resolve.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }
}
