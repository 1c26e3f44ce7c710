//! Error taxonomy for the zkLogin session subsystem

use crate::session::SessionPhase;

/// Errors surfaced by the session subsystem.
///
/// Fatal variants force a re-login: the session transitions to
/// `SessionPhase::Invalid` and the persisted checkpoint is cleared.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Stored key material has the wrong width. Never truncated or padded.
    #[error("malformed key material: expected {expected} bytes, got {actual}")]
    MalformedKey { expected: usize, actual: usize },

    /// The redirect URL carries no identity token in fragment or query.
    #[error("redirect URL carries no identity token")]
    MissingToken,

    /// The identity token is structurally invalid or fails the nonce binding.
    #[error("malformed identity token: {0}")]
    MalformedToken(String),

    /// A salt value is not a valid fixed-length decimal string.
    #[error("malformed user salt: expected a {0}-digit decimal string")]
    MalformedSalt(usize),

    /// The proving service rejected the request or failed.
    #[error("proving service error {status}: {message}")]
    ProofService { status: u16, message: String },

    /// HTTP or network failure reaching the proving service.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The session's validity window elapsed before the operation completed.
    #[error("max epoch {max_epoch} elapsed (current epoch {current_epoch}), re-login required")]
    StaleEpoch { max_epoch: u64, current_epoch: u64 },

    /// A persisted session record is missing required fields.
    #[error("incomplete persisted session: missing {missing}")]
    IncompleteSession { missing: &'static str },

    /// The proof was fetched under a different (key, epoch, randomness) binding.
    #[error("proof was generated under a different session binding")]
    ProofBinding,

    /// A session operation was invoked out of protocol order.
    #[error("operation `{op}` is not valid in phase {phase:?}")]
    Phase { op: &'static str, phase: SessionPhase },

    /// Filesystem failure reading or writing the session store.
    #[error(transparent)]
    Storage(#[from] std::io::Error),

    /// JSON encode/decode failure.
    #[error(transparent)]
    Codec(#[from] serde_json::Error),

    /// Encryption or key-derivation failure in the session store.
    #[error("session store crypto failure: {0}")]
    Crypto(String),
}

impl Error {
    /// Whether this error invalidates the session and forces a re-login.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MalformedKey { .. }
                | Error::MalformedToken(_)
                | Error::StaleEpoch { .. }
                | Error::IncompleteSession { .. }
                | Error::ProofBinding
        )
    }

    /// Whether the operation may be retried with backoff (5xx / network).
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ProofService { status, .. } => *status >= 500,
            Error::Request(_) => true,
            _ => false,
        }
    }
}
