//! Error types for the license core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// License-validation errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// A required file (license, public key) was not found.
    #[error("license artifact not found: {0}")]
    MissingArtifact(String),

    /// The public-key PEM could not be parsed.
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// The payload could not be decrypted (malformed, tampered, wrong key).
    #[error("license decryption failed: {0}")]
    Decryption(String),

    /// Decrypted plaintext is not a well-formed license record.
    #[error("invalid license payload: {0}")]
    InvalidPayload(String),

    /// The record predates the current format and must be regenerated.
    #[error("license file uses a retired format and must be regenerated")]
    LegacyFormat,

    /// Client-store lookup failed.
    #[error("client store error: {0}")]
    Store(String),

    /// Filesystem error while reading or bootstrapping artifacts.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Maps this error onto the coarse fault taxonomy carried by invalid
    /// snapshots.
    #[must_use]
    pub fn fault(&self) -> LicenseFault {
        match self {
            Self::MissingArtifact(_) | Self::Io(_) => LicenseFault::MissingArtifact,
            Self::LegacyFormat => LicenseFault::LegacyFormat,
            Self::InvalidKey(_)
            | Self::Decryption(_)
            | Self::InvalidPayload(_)
            | Self::Store(_)
            | Self::Serialization(_) => LicenseFault::DecryptionFailure,
        }
    }
}

/// Why a snapshot came back invalid. Lets callers distinguish "install a
/// license" from "this license is broken" from "regenerate your license".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseFault {
    /// License file or public key missing on disk.
    MissingArtifact,
    /// Payload failed to decrypt or parse.
    DecryptionFailure,
    /// Record shape predates the current license format.
    LegacyFormat,
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
