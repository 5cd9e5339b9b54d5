//! Error types for remote writes
//!
//! [`RemoteError`] is cloneable and serializable so that reconciliation
//! outcomes can keep the exact failure detail alongside the node it belongs
//! to.

use serde::{Deserialize, Serialize};

/// A single create/update call failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteError {
    /// Connection, DNS, TLS or IO failure before a response arrived
    #[error("request failed: {message}")]
    Transport {
        /// Transport-level description
        message: String,
    },

    /// The backend answered with a non-2xx status
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// No response within the configured deadline
    #[error("request timed out after {after_secs}s")]
    Timeout {
        /// Deadline that expired
        after_secs: u64,
    },

    /// A create got no answer within the deadline
    ///
    /// The backend may still have applied it, so the node's id is unknown.
    /// Repeating the create can produce a duplicate.
    #[error("no answer within {after_secs}s, the create may have been applied")]
    Unconfirmed {
        /// Deadline that expired
        after_secs: u64,
    },

    /// The response body was not the expected record
    #[error("malformed response: {message}")]
    Decode {
        /// Parser message
        message: String,
    },

    /// The request could not be built
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// What was wrong
        message: String,
    },
}

impl RemoteError {
    /// Transport failure
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Non-2xx response
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Malformed response
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Reclassify a timeout of a non-idempotent write as [`Self::Unconfirmed`]
    #[must_use]
    pub fn unconfirmed_if_timeout(self) -> Self {
        match self {
            Self::Timeout { after_secs } => Self::Unconfirmed { after_secs },
            other => other,
        }
    }

    /// HTTP status code, when the server answered at all
    #[inline]
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the payload itself (400 / 409 / 422)
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self.http_status(), Some(400 | 409 | 422))
    }

    /// Check if the same call could reasonably succeed when repeated
    ///
    /// Nothing in the workspace retries on its own; this only informs the
    /// caller.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Unconfirmed { .. } | Self::Decode { .. } | Self::InvalidRequest { .. } => false,
        }
    }
}
