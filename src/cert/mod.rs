pub mod params;

use crate::error::CertError;
pub type Result<T> = std::result::Result<T, CertError>;
use pem::{EncodeConfig, LineEnding, Pem};
use rand_core::CryptoRngCore;
use sha2::{Digest, Sha256};

use crate::asn1::{self, Value};
use crate::issuer::{Issuer, SelfIssuer};
use crate::key::SigningKeyPair;
use crate::tbs_certificate::ECDSA_WITH_SHA256;
use params::{AlgorithmParameters, IssuanceParams};

const PEM_LABEL: &str = "CERTIFICATE";

/// Represents the supported signature algorithms for certificates.
///
/// Only ECDSA over P-256 with SHA-256 is issued. The variant carries the
/// parameter convention so the TBS and outer identifiers cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// ecdsa-with-SHA256 (1.2.840.10045.4.3.2).
    EcdsaWithSha256(AlgorithmParameters),
}

impl Default for SignatureAlgorithm {
    fn default() -> Self {
        SignatureAlgorithm::EcdsaWithSha256(AlgorithmParameters::default())
    }
}

impl SignatureAlgorithm {
    pub fn oid_arcs(&self) -> &'static [u64] {
        match self {
            SignatureAlgorithm::EcdsaWithSha256(_) => &ECDSA_WITH_SHA256,
        }
    }

    pub fn parameters(&self) -> AlgorithmParameters {
        match self {
            SignatureAlgorithm::EcdsaWithSha256(parameters) => *parameters,
        }
    }

    /// Encodes the `AlgorithmIdentifier` SEQUENCE.
    ///
    /// Both the TBS `signature` field and the outer `signatureAlgorithm`
    /// field are produced here and nowhere else.
    pub fn algorithm_identifier(&self) -> Result<Value> {
        let mut fields = vec![asn1::object_identifier(self.oid_arcs())?];
        if self.parameters() == AlgorithmParameters::Null {
            fields.push(asn1::null());
        }
        Ok(asn1::sequence(fields))
    }
}

/// A DER-encoded X.509 certificate.
///
/// The bytes are fixed once built; clones share nothing mutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    /// Wraps DER bytes without checking them.
    ///
    /// Use [`crate::validator::validate`] to find out whether a parser accepts them.
    pub fn from_der(der: Vec<u8>) -> Self {
        Self { der }
    }

    /// Decodes a `CERTIFICATE` PEM block.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let pem = pem::parse(pem_str)?;
        if pem.tag() != PEM_LABEL {
            return Err(CertError::DecodingError(format!(
                "expected PEM label {PEM_LABEL}, found {}",
                pem.tag()
            )));
        }
        Ok(Self::from_der(pem.into_contents()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.der
    }

    /// Encodes the certificate into DER format.
    ///
    /// # Returns
    /// A byte vector containing the DER-encoded certificate.
    pub fn to_der(&self) -> Vec<u8> {
        self.der.clone()
    }

    /// Encodes the certificate into PEM format with LF line endings.
    pub fn to_pem(&self) -> String {
        let pem = Pem::new(PEM_LABEL, self.der.clone());
        pem::encode_config(&pem, EncodeConfig::new().set_line_ending(LineEnding::LF))
    }

    /// SHA-256 over the DER bytes, the value a peer pins during pairing.
    pub fn fingerprint_sha256(&self) -> [u8; 32] {
        Sha256::digest(&self.der).into()
    }

    /// Colon separated upper-case hex of [`Self::fingerprint_sha256`].
    pub fn fingerprint_hex(&self) -> String {
        let digits = hex::encode_upper(self.fingerprint_sha256());
        digits
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair))
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Creates a new self-signed certificate.
    ///
    /// # Arguments
    /// * `params` - Common name, validity and algorithm parameter convention.
    /// * `key` - The key pair whose public half is certified and whose private half signs.
    /// * `rng` - Source for the serial number (when not fixed) and the signature nonce.
    ///
    /// # Returns
    /// The signed `Certificate`, or the first error hit; nothing partial is returned.
    pub fn new_self_signed<K, R>(params: &IssuanceParams, key: &K, rng: &mut R) -> Result<Self>
    where
        K: SigningKeyPair,
        R: CryptoRngCore,
    {
        let issuer = SelfIssuer {
            name: params.common_name.clone(),
            key,
            parameters: params.parameters,
        };
        let serial = match params.serial {
            Some(serial) => serial,
            None => crate::issuer::random_serial(rng)?,
        };
        issuer.issue(serial, &params.validity()?, rng)
    }
}

/// Wraps a signed TBS into `Certificate ::= SEQUENCE { tbs, algorithm, signature }`.
///
/// `tbs` is embedded verbatim, `signature` is the DER `Ecdsa-Sig-Value`
/// placed in a BIT STRING.
///
/// # Errors
/// [`CertError::CertificateBuildError`] if `tbs` is not a SEQUENCE or the
/// signature is empty.
pub fn build_certificate(
    tbs: &[u8],
    algorithm: SignatureAlgorithm,
    signature: &[u8],
) -> Result<Certificate> {
    if tbs.first() != Some(&asn1::TAG_SEQUENCE) {
        return Err(CertError::CertificateBuildError(
            "TBS certificate must be a DER SEQUENCE".to_string(),
        ));
    }
    if signature.is_empty() {
        return Err(CertError::CertificateBuildError(
            "signature is empty".to_string(),
        ));
    }
    let algorithm_identifier = algorithm
        .algorithm_identifier()
        .map_err(CertError::into_build_error)?;
    let certificate = asn1::sequence(vec![
        asn1::encoded(tbs.to_vec()),
        algorithm_identifier,
        asn1::bit_string(signature),
    ]);
    Ok(Certificate::from_der(certificate.to_der()))
}
