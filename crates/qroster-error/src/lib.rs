//! Error type shared across the qroster workspace.
//!
//! Every crate returns [`RosterError`] through the [`Result`] alias. Remote
//! failures are split into two variants so that callers can tell "the
//! network is gone" ([`RosterError::RemoteUnavailable`]) from "the server
//! answered and said no" ([`RosterError::RemoteRejected`]).

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T, E = RosterError> = std::result::Result<T, E>;

/// Primary error type.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Filesystem failure underneath the local store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A local store slot exists but cannot be decoded.
    #[error("local slot `{slot}` is corrupt: {detail}")]
    CorruptSlot { slot: String, detail: String },

    /// A checklist value matched neither the structured nor the encoded shape.
    #[error("malformed checklist: {0}")]
    MalformedChecklist(String),

    /// The remote answered but its rows could not be decoded.
    #[error("malformed remote rows: {0}")]
    MalformedRow(String),

    /// The remote endpoint could not be reached at all.
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote endpoint answered with a non-success status.
    #[error("remote rejected request (status {status}, code {code}): {message}")]
    RemoteRejected {
        status: u16,
        code: String,
        message: String,
    },

    /// Login failed on both the provider and the fallback path.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The operation needs a session and none is installed.
    #[error("not signed in")]
    NotSignedIn,

    /// No school with this id is visible to the current session.
    #[error("no accessible school with id `{0}`")]
    UnknownSchool(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invariant violation inside qroster itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RosterError {
    /// Create an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a corrupt-slot error.
    pub fn corrupt_slot(slot: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::CorruptSlot {
            slot: slot.into(),
            detail: detail.into(),
        }
    }

    /// Create a remote-unavailable error.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::RemoteUnavailable(detail.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error means the remote side is unreachable or refused
    /// service, as opposed to a local fault.
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable(_) | Self::RemoteRejected { .. }
        )
    }

    /// Server-side error code, when the remote supplied one.
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Self::RemoteRejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RosterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("json: {err}"))
    }
}
