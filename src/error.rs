//! use paircert::error::CertError;

use thiserror::Error;

/// Represents errors that can occur while issuing or checking a pairing certificate.
///
/// Any of these aborts issuance; no partially built certificate is ever returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertError {
    /// Malformed object identifier arcs.
    #[error("Invalid OID: {0}")]
    InvalidOid(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error while producing the ECDSA signature.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// Error while assembling the TBS or outer certificate structure.
    #[error("Certificate build error: {0}")]
    CertificateBuildError(String),

    /// A value the DER encoder cannot represent.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),
}

impl CertError {
    /// Folds an encoder failure into the builder's error kind.
    pub(crate) fn into_build_error(self) -> Self {
        match self {
            CertError::CertificateBuildError(_) => self,
            other => CertError::CertificateBuildError(other.to_string()),
        }
    }
}

impl From<der::Error> for CertError {
    /// Converts a `der::Error` into a `CertError`.
    fn from(err: der::Error) -> Self {
        CertError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for CertError {
    fn from(err: pem::PemError) -> Self {
        CertError::DecodingError(err.to_string())
    }
}
