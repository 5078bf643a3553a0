//! Error taxonomy shared by the directory and its callers.
//!
//! Every failure belongs to exactly one `ErrorKind`:
//!   Authentication — the ping is inauthentic or from a client too old to
//!                    follow activated fork rules
//!   Validation     — the ping is stale or carries a malformed field
//!   Fatal          — boot-time only; the process cannot start

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Validation,
    Fatal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::Validation => "validation",
            ErrorKind::Fatal => "fatal",
        }
    }
}

/// Why an inbound ping was rejected. The ping is discarded and the
/// registry is left untouched in every case.
#[derive(Debug, Error)]
pub enum PingError {
    #[error("hash mismatch, client data inconsistent (claimed {claimed}, computed {computed})")]
    HashMismatch { claimed: String, computed: String },

    #[error("signature does not match node identity {identity}")]
    BadSignature { identity: String },

    #[error("software version {version:?} below minimum for forks active at height {height}")]
    VersionRejected { version: String, height: u64 },

    #[error("timestamp skew {skew}s exceeds tolerance of {tolerance}s")]
    TimestampSkew { skew: u64, tolerance: u64 },

    #[error("malformed field {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl PingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PingError::HashMismatch { .. }
            | PingError::BadSignature { .. }
            | PingError::VersionRejected { .. } => ErrorKind::Authentication,
            PingError::TimestampSkew { .. } | PingError::Malformed { .. } => ErrorKind::Validation,
        }
    }

    /// Stable machine-readable code for the HTTP error body.
    pub fn code(&self) -> &'static str {
        match self {
            PingError::HashMismatch { .. } => "hash_mismatch",
            PingError::BadSignature { .. } => "bad_signature",
            PingError::VersionRejected { .. } => "version_rejected",
            PingError::TimestampSkew { .. } => "timestamp_skew",
            PingError::Malformed { .. } => "malformed",
        }
    }

    pub(crate) fn malformed(field: &'static str, reason: impl ToString) -> Self {
        PingError::Malformed {
            field,
            reason: reason.to_string(),
        }
    }
}
