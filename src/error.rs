//! Error types for the indirect-connection protocol engine.

use std::time::Duration;

/// Main error types for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The peer sent something the current protocol state cannot accept:
    /// wrong message type, malformed TLV, or a proof that does not verify.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// An encoding, signal vector or registry entry is structurally invalid.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A zk proof was rejected by the proving backend or by a consistency check.
    #[error("Invalid proof: {0}")]
    ProofInvalid(String),

    /// The SMP result was requested before the session finished.
    #[error("SMP session has not finished")]
    SessionNotFinished,

    /// The external proving backend failed.
    #[error("Proving backend error: {0}")]
    Backend(String),

    /// The external proving backend did not answer in time.
    #[error("Proving backend timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid circuit configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` for errors that end the current SMP session.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Error::ProtocolViolation(_))
    }
}

/// Result type alias using the library's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
