//! Unified error type for the vidtrack client.
//!
//! Every failure mode the tracker can encounter funnels into [`Error`]. The
//! taxonomy matters more than the messages: transport failures are retryable
//! and generic, timeouts are distinct (the server-side job may still have
//! finished), validation failures happen before any network call, and
//! stage-level failures are scoped to a single stage. A missing per-stage
//! result (HTTP 404) is *not* an error anywhere in this crate; it is encoded
//! as `Ok(None)` at the API seam.

use std::time::Duration;

use crate::model::StageKind;

/// Unified error type covering all failure modes in the tracker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The network request could not be completed (unreachable host, broken
    /// connection, malformed response body). Retryable on the next poll.
    #[error("Network error: {source}")]
    Transport {
        /// The underlying HTTP client error.
        source: reqwest::Error,
    },

    /// The request exceeded its configured deadline. Distinct from
    /// [`Error::Transport`] because the remote pipeline may have completed
    /// despite the client giving up waiting.
    #[error("Request timed out after {}s", .after.as_secs())]
    Timeout {
        /// The deadline that was exceeded.
        after: Duration,
    },

    /// Client-side input failed validation; no network call was made.
    /// The message is user-facing and names the specific reason.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The server reported a failure for one pipeline stage. Does not affect
    /// sibling stages.
    #[error("Stage error [{stage}]: {message}")]
    Stage {
        /// The stage that failed.
        stage: StageKind,
        /// Server-supplied error description.
        message: String,
    },

    /// The server answered with a non-success HTTP status other than 404.
    #[error("API error: HTTP {status}: {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// A local I/O operation failed (reading the file to upload).
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify a `reqwest` failure, separating deadline expiry from every
    /// other transport problem.
    pub fn from_reqwest(source: reqwest::Error, deadline: Duration) -> Self {
        if source.is_timeout() {
            Error::Timeout { after: deadline }
        } else {
            Error::Transport { source }
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Timeout { .. })
    }

    /// Convenience constructor for [`Error::Stage`].
    pub fn stage(stage: StageKind, message: impl Into<String>) -> Self {
        Error::Stage {
            stage,
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
