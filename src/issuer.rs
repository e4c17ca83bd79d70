use rand_core::CryptoRngCore;

use crate::cert::params::{AlgorithmParameters, IssuanceParams, Validity};
use crate::cert::{Certificate, SignatureAlgorithm, build_certificate};
use crate::error::CertError;
use crate::key::{KeyProvider, SigningKeyPair};
use crate::tbs_certificate::TbsCertificate;

pub type Result<T> = std::result::Result<T, CertError>;

// Bounds the redraw loop in `random_serial`; a zero serial is a 2^-64 event.
const MAX_SERIAL_DRAWS: usize = 8;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    type KeyPair: SigningKeyPair;

    /// Returns the common name of the issuer.
    fn issuer_name(&self) -> &str;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &Self::KeyPair;

    /// Returns the algorithm identifier convention used for both identifiers.
    fn signature_algorithm(&self) -> SignatureAlgorithm;

    /// Issues a certificate over the issuer's own public key.
    ///
    /// # Arguments
    /// * `serial` - Positive serial number.
    /// * `validity` - The notBefore/notAfter window.
    /// * `rng` - Nonce source for the ECDSA signature.
    ///
    /// # Returns
    /// The signed certificate. The TBS is signed exactly once and any failure
    /// aborts before a certificate exists.
    fn issue<R: CryptoRngCore>(
        &self,
        serial: u64,
        validity: &Validity,
        rng: &mut R,
    ) -> Result<Certificate> {
        let algorithm = self.signature_algorithm();
        let tbs_cert = TbsCertificate {
            serial_number: serial,
            signature_algorithm: algorithm,
            common_name: self.issuer_name().to_string(),
            validity: validity.clone(),
            subject_public_key: self.signing_key().public_key().clone(),
        };
        let tbs = tbs_cert.to_der()?;
        log::debug!(
            "Built TBS for CN={} serial={serial:#x} ({} bytes)",
            tbs_cert.common_name,
            tbs.len()
        );

        let signature = self.signing_key().sign(rng, &tbs)?;
        let certificate = build_certificate(&tbs, algorithm, &signature)?;
        log::info!(
            "Issued self-signed certificate CN={} serial={serial:#x} sha256={}",
            tbs_cert.common_name,
            certificate.fingerprint_hex()
        );
        Ok(certificate)
    }
}

// Helper struct for self-signed certificates
pub(crate) struct SelfIssuer<'a, K> {
    pub(crate) name: String,
    pub(crate) key: &'a K,
    pub(crate) parameters: AlgorithmParameters,
}

impl<K: SigningKeyPair> Issuer for SelfIssuer<'_, K> {
    type KeyPair = K;

    fn issuer_name(&self) -> &str {
        &self.name
    }

    fn signing_key(&self) -> &K {
        self.key
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::EcdsaWithSha256(self.parameters)
    }
}

/// Draws a serial number uniformly from `1..=u64::MAX`.
pub fn random_serial<R: CryptoRngCore>(rng: &mut R) -> Result<u64> {
    let mut bytes = [0u8; 8];
    for _ in 0..MAX_SERIAL_DRAWS {
        rng.try_fill_bytes(&mut bytes).map_err(|e| {
            CertError::CertificateBuildError(format!("serial number entropy failed: {e}"))
        })?;
        let serial = u64::from_be_bytes(bytes);
        if serial != 0 {
            return Ok(serial);
        }
    }
    Err(CertError::CertificateBuildError(
        "no non-zero serial number drawn from entropy source".to_string(),
    ))
}

/// A freshly issued certificate together with the key pair it certifies.
#[derive(Debug, Clone)]
pub struct CertificateWithKey<K> {
    pub cert: Certificate,
    pub key: K,
}

/// Runs one complete issuance: new key pair, serial, TBS, signature, certificate.
///
/// Every call generates its own key pair and serial, so concurrent pairing
/// attempts share nothing.
pub fn issue_self_signed<P, R>(
    provider: &P,
    params: &IssuanceParams,
    rng: &mut R,
) -> Result<CertificateWithKey<P::KeyPair>>
where
    P: KeyProvider,
    R: CryptoRngCore,
{
    let key = provider.generate_key_pair(rng)?;
    let cert = Certificate::new_self_signed(params, &key, rng)?;
    Ok(CertificateWithKey { cert, key })
}
