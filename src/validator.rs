//! Acceptance check for issued certificates.
//!
//! Feeds certificate bytes to the `x509-cert` parser and applies the checks a
//! strict platform parser applies to a self-signed leaf: canonical DER,
//! identical inner and outer signature algorithm identifiers, the P-256
//! profile, issuer equal to subject, and a self-signature that verifies.
//! This runs in tests and the probe binary, never in the pairing flow.

use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519::CN;
use const_oid::db::rfc5912::{ECDSA_WITH_SHA_256, ID_EC_PUBLIC_KEY, SECP_256_R_1};
use der::{Decode, Encode, Tag, Tagged};
use time::OffsetDateTime;
use x509_cert::Certificate as X509Certificate;
use x509_cert::Version;
use x509_cert::name::Name;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::cert::params::AlgorithmParameters;
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::CertError;
use crate::key::PublicKey;

/// Number of leading bytes dumped when a certificate is rejected.
pub const DIAGNOSTIC_PREFIX_LEN: usize = 64;

/// What the parser saw in an accepted certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSummary {
    /// Subject common name, or the RFC 4514 rendering when there is none.
    pub subject: String,
    pub issuer: String,
    /// Serial number content octets in hex.
    pub serial_number: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub signature_algorithm: SignatureAlgorithm,
}

/// Why a certificate was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The reference parser could not decode the bytes.
    Malformed(String),
    /// Decodes, but re-encoding does not give back the same bytes.
    NonCanonical,
    /// The TBS `signature` and outer `signatureAlgorithm` differ.
    AlgorithmMismatch,
    UnsupportedAlgorithm(String),
    UnsupportedKey(String),
    NotSelfSigned,
    BadSignature,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Malformed(msg) => write!(f, "malformed certificate: {msg}"),
            RejectionReason::NonCanonical => write!(f, "encoding is not canonical DER"),
            RejectionReason::AlgorithmMismatch => {
                write!(f, "inner and outer signature algorithm identifiers differ")
            }
            RejectionReason::UnsupportedAlgorithm(msg) => {
                write!(f, "unsupported signature algorithm: {msg}")
            }
            RejectionReason::UnsupportedKey(msg) => write!(f, "unsupported public key: {msg}"),
            RejectionReason::NotSelfSigned => write!(f, "issuer does not match subject"),
            RejectionReason::BadSignature => write!(f, "self-signature does not verify"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectionReason,
    /// Hex of the first [`DIAGNOSTIC_PREFIX_LEN`] bytes of the input.
    pub prefix_hex: String,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acceptance {
    Accepted(ParsedSummary),
    Rejected(Rejection),
}

impl Acceptance {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Acceptance::Accepted(_))
    }

    pub fn summary(&self) -> Option<&ParsedSummary> {
        match self {
            Acceptance::Accepted(summary) => Some(summary),
            Acceptance::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Acceptance::Accepted(_) => None,
            Acceptance::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Returns `true` when `der` parses as a well-formed pairing certificate.
pub fn accepts(der: &[u8]) -> bool {
    validate(der).is_accepted()
}

/// Runs every check and reports the first failure, if any.
pub fn validate(der: &[u8]) -> Acceptance {
    match inspect(der) {
        Ok(summary) => {
            log::info!("Certificate accepted: {}", summary.subject);
            Acceptance::Accepted(summary)
        }
        Err(reason) => {
            let prefix_hex = hex::encode(&der[..der.len().min(DIAGNOSTIC_PREFIX_LEN)]);
            log::warn!("Certificate rejected: {reason}");
            log::debug!("First bytes: {prefix_hex}");
            Acceptance::Rejected(Rejection { reason, prefix_hex })
        }
    }
}

/// [`validate`] for PEM input.
///
/// # Errors
/// [`CertError::DecodingError`] when the text is not a `CERTIFICATE` PEM block.
pub fn validate_pem(pem_str: &str) -> Result<Acceptance, CertError> {
    let cert = Certificate::from_pem(pem_str)?;
    Ok(validate(cert.as_bytes()))
}

fn inspect(der: &[u8]) -> Result<ParsedSummary, RejectionReason> {
    let cert =
        X509Certificate::from_der(der).map_err(|e| RejectionReason::Malformed(e.to_string()))?;
    let reencoded = cert
        .to_der()
        .map_err(|e| RejectionReason::Malformed(e.to_string()))?;
    if reencoded != der {
        return Err(RejectionReason::NonCanonical);
    }

    let tbs = &cert.tbs_certificate;
    if tbs.version != Version::V3 {
        return Err(RejectionReason::Malformed(format!(
            "expected version 3, found {:?}",
            tbs.version
        )));
    }
    if tbs.signature != cert.signature_algorithm {
        return Err(RejectionReason::AlgorithmMismatch);
    }
    let signature_algorithm = classify_algorithm(&cert.signature_algorithm)?;

    let public_key = p256_public_key(&tbs.subject_public_key_info)?;

    if tbs.issuer != tbs.subject {
        return Err(RejectionReason::NotSelfSigned);
    }

    // Canonical encoding was checked above, so this is the signed slice.
    let tbs_der = tbs
        .to_der()
        .map_err(|e| RejectionReason::Malformed(e.to_string()))?;
    let signature = cert
        .signature
        .as_bytes()
        .ok_or_else(|| RejectionReason::Malformed("signature has unused bits".to_string()))?;
    if !public_key.verify(&tbs_der, signature) {
        return Err(RejectionReason::BadSignature);
    }

    Ok(ParsedSummary {
        subject: common_name(&tbs.subject).unwrap_or_else(|| tbs.subject.to_string()),
        issuer: common_name(&tbs.issuer).unwrap_or_else(|| tbs.issuer.to_string()),
        serial_number: hex::encode(tbs.serial_number.as_bytes()),
        not_before: OffsetDateTime::from(tbs.validity.not_before.to_system_time()),
        not_after: OffsetDateTime::from(tbs.validity.not_after.to_system_time()),
        signature_algorithm,
    })
}

fn classify_algorithm(
    algorithm: &AlgorithmIdentifierOwned,
) -> Result<SignatureAlgorithm, RejectionReason> {
    if algorithm.oid != ECDSA_WITH_SHA_256 {
        return Err(RejectionReason::UnsupportedAlgorithm(algorithm.oid.to_string()));
    }
    let parameters = match &algorithm.parameters {
        None => AlgorithmParameters::Absent,
        Some(any) if any.tag() == Tag::Null && any.value().is_empty() => AlgorithmParameters::Null,
        Some(any) => {
            return Err(RejectionReason::UnsupportedAlgorithm(format!(
                "unexpected {} parameter",
                any.tag()
            )));
        }
    };
    Ok(SignatureAlgorithm::EcdsaWithSha256(parameters))
}

fn p256_public_key(
    spki: &x509_cert::spki::SubjectPublicKeyInfoOwned,
) -> Result<PublicKey, RejectionReason> {
    if spki.algorithm.oid != ID_EC_PUBLIC_KEY {
        return Err(RejectionReason::UnsupportedKey(spki.algorithm.oid.to_string()));
    }
    let curve = spki
        .algorithm
        .parameters
        .as_ref()
        .and_then(|any| any.decode_as::<ObjectIdentifier>().ok());
    if curve != Some(SECP_256_R_1) {
        return Err(RejectionReason::UnsupportedKey(
            "curve is not prime256v1".to_string(),
        ));
    }
    let point = spki
        .subject_public_key
        .as_bytes()
        .ok_or_else(|| RejectionReason::UnsupportedKey("key has unused bits".to_string()))?;
    PublicKey::from_sec1_bytes(point).map_err(|e| RejectionReason::UnsupportedKey(e.to_string()))
}

/// Extracts the first common name attribute of `name`.
pub fn common_name(name: &Name) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|attr| attr.oid == CN)
        .and_then(|attr| attr.value.decode_as::<String>().ok())
}
