//! # paircert - Self-Signed Certificates for Local Device Pairing
//!
//! paircert issues the short-lived, self-signed X.509 certificate a phone and
//! its desktop companion exchange when pairing over the local network. There
//! is no certificate authority: each side pins the other's certificate.
//!
//! The certificate is assembled by a small DER encoder of its own rather than
//! a generic ASN.1 library, so every byte of the output is under control.
//! Exactly one profile is produced:
//!
//! - **Key**: ECDSA P-256, subjectPublicKeyInfo with id-ecPublicKey + prime256v1
//! - **Signature**: ecdsa-with-SHA256
//! - **Names**: a single common name, identical for issuer and subject
//! - **Validity**: 365 days from issuance by default
//! - **Extensions**: none
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paircert::{
//!     cert::params::IssuanceParams,
//!     issuer::issue_self_signed,
//!     key::SoftwareKeyProvider,
//!     validator,
//! };
//!
//! # fn main() -> Result<(), paircert::error::CertError> {
//! let params = IssuanceParams::builder()
//!     .common_name("HealthSync Local")
//!     .build();
//!
//! let issued = issue_self_signed(&SoftwareKeyProvider, &params, &mut rand_core::OsRng)?;
//!
//! assert!(validator::accepts(issued.cert.as_bytes()));
//! println!("{}", issued.cert.to_pem());
//! println!("pin: {}", issued.cert.fingerprint_hex());
//! # Ok(())
//! # }
//! ```
//!
//! ## The NULL parameter question
//!
//! The signature algorithm identifier appears twice: inside the signed TBS
//! and next to the signature. Some encoders write `SEQUENCE { OID, NULL }`,
//! others `SEQUENCE { OID }`, and parsers that compare the two copies reject
//! a certificate where they differ. [`cert::params::AlgorithmParameters`]
//! picks one convention and [`cert::SignatureAlgorithm::algorithm_identifier`]
//! is the only code that encodes it, so both copies always match.
//!
//! ## Module Organization
//!
//! - [`asn1`]: DER primitive encoder
//! - [`key`]: P-256 key generation and signing behind [`key::KeyProvider`]
//! - [`tbs_certificate`]: TBSCertificate assembly
//! - [`cert`]: Certificate assembly, PEM, fingerprints, issuance parameters
//! - [`issuer`]: the issuance pipeline
//! - [`validator`]: acceptance check against a reference parser
//! - [`error`]: error types

pub mod asn1;
pub mod cert;
pub mod error;
pub mod issuer;
pub mod key;
pub mod tbs_certificate;
pub mod validator;
