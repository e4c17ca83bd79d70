use std::fmt;

use p256::FieldBytes;
use p256::ecdsa::signature::{RandomizedSigner, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::CryptoRngCore;

use crate::error::CertError;

pub type Result<T> = std::result::Result<T, CertError>;

/// Length of an uncompressed P-256 point: `0x04 || X || Y`.
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

const SCALAR_LEN: usize = 32;
// A uniformly random 32-byte string is a valid P-256 scalar with
// overwhelming probability; this bounds the redraw loop.
const MAX_SCALAR_DRAWS: usize = 8;

/// A P-256 public key, exported as an uncompressed SEC1 point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    pub fn from_verifying_key(verifying_key: VerifyingKey) -> Self {
        Self(verifying_key)
    }

    /// Parses a SEC1 encoded point (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| CertError::DecodingError(format!("invalid P-256 point: {e}")))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }

    /// Returns `0x04 || X || Y`, the form embedded in subjectPublicKeyInfo.
    pub fn to_uncompressed_point(&self) -> [u8; UNCOMPRESSED_POINT_LEN] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; UNCOMPRESSED_POINT_LEN];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Checks a DER encoded ECDSA/SHA-256 signature over `message`.
    pub fn verify(&self, message: &[u8], der_signature: &[u8]) -> bool {
        match Signature::from_der(der_signature) {
            Ok(signature) => self.0.verify(message, &signature).is_ok(),
            Err(_) => false,
        }
    }
}

/// A key pair able to sign a TBS buffer with ecdsa-with-SHA256.
///
/// The private half never leaves the implementation.
pub trait SigningKeyPair {
    /// Returns the public half of the pair.
    fn public_key(&self) -> &PublicKey;

    /// Signs SHA-256(`message`) and returns the DER `Ecdsa-Sig-Value`.
    ///
    /// # Errors
    /// [`CertError::SigningError`] when the key cannot produce a signature.
    fn sign<R: CryptoRngCore>(&self, rng: &mut R, message: &[u8]) -> Result<Vec<u8>>;
}

/// Capability for producing fresh P-256 key pairs.
///
/// Software keys live in process memory; a platform-backed provider (secure
/// enclave, HSM) implements the same trait and keeps its keys out of reach.
pub trait KeyProvider {
    type KeyPair: SigningKeyPair;

    /// Generates a new key pair, drawing entropy from `rng`.
    ///
    /// # Errors
    /// [`CertError::KeyGenerationError`] when entropy cannot be obtained.
    fn generate_key_pair<R: CryptoRngCore>(&self, rng: &mut R) -> Result<Self::KeyPair>;
}

/// Generates in-memory P-256 keys with RustCrypto.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareKeyProvider;

impl KeyProvider for SoftwareKeyProvider {
    type KeyPair = SoftwareKeyPair;

    fn generate_key_pair<R: CryptoRngCore>(&self, rng: &mut R) -> Result<SoftwareKeyPair> {
        let mut secret = [0u8; SCALAR_LEN];
        for _ in 0..MAX_SCALAR_DRAWS {
            rng.try_fill_bytes(&mut secret)
                .map_err(|e| CertError::KeyGenerationError(format!("entropy source failed: {e}")))?;
            let candidate = SigningKey::from_bytes(FieldBytes::from_slice(&secret));
            secret.fill(0);
            if let Ok(signing_key) = candidate {
                return Ok(SoftwareKeyPair::from_signing_key(signing_key));
            }
        }
        Err(CertError::KeyGenerationError(
            "no valid P-256 scalar drawn from entropy source".to_string(),
        ))
    }
}

/// An ECDSA P-256 key pair held in process memory.
#[derive(Clone)]
pub struct SoftwareKeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl SoftwareKeyPair {
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey::from_verifying_key(*signing_key.verifying_key());
        Self {
            signing_key,
            public_key,
        }
    }
}

impl fmt::Debug for SoftwareKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareKeyPair")
            .field("public_key", &hex::encode(self.public_key.to_uncompressed_point()))
            .finish_non_exhaustive()
    }
}

impl SigningKeyPair for SoftwareKeyPair {
    fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    fn sign<R: CryptoRngCore>(&self, rng: &mut R, message: &[u8]) -> Result<Vec<u8>> {
        let signature: Signature = self
            .signing_key
            .try_sign_with_rng(rng, message)
            .map_err(|e| CertError::SigningError(e.to_string()))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_core::{CryptoRng, RngCore};

    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0)
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            Err(rand_core::Error::new("entropy unavailable"))
        }
    }

    impl CryptoRng for FailingRng {}

    #[test]
    fn exports_uncompressed_point() {
        let mut rng = StdRng::seed_from_u64(7);
        let key = SoftwareKeyProvider.generate_key_pair(&mut rng).unwrap();
        let point = key.public_key().to_uncompressed_point();
        assert_eq!(point.len(), UNCOMPRESSED_POINT_LEN);
        assert_eq!(point[0], 0x04);
        assert_eq!(&PublicKey::from_sec1_bytes(&point).unwrap(), key.public_key());
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = SoftwareKeyProvider
            .generate_key_pair(&mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = SoftwareKeyProvider
            .generate_key_pair(&mut StdRng::seed_from_u64(42))
            .unwrap();
        let c = SoftwareKeyProvider
            .generate_key_pair(&mut StdRng::seed_from_u64(43))
            .unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.public_key(), c.public_key());
    }

    #[test]
    fn signature_is_der_and_verifies() {
        let mut rng = StdRng::seed_from_u64(1);
        let key = SoftwareKeyProvider.generate_key_pair(&mut rng).unwrap();
        let signature = key.sign(&mut rng, b"tbs bytes").unwrap();
        assert_eq!(signature[0], 0x30);
        assert!(signature.len() <= 72);
        assert!(key.public_key().verify(b"tbs bytes", &signature));
        assert!(!key.public_key().verify(b"other bytes", &signature));
        assert!(!key.public_key().verify(b"tbs bytes", &signature[1..]));
    }

    #[test]
    fn signatures_are_randomized() {
        let mut rng = StdRng::seed_from_u64(2);
        let key = SoftwareKeyProvider.generate_key_pair(&mut rng).unwrap();
        let first = key.sign(&mut rng, b"same message").unwrap();
        let second = key.sign(&mut rng, b"same message").unwrap();
        assert_ne!(first, second);
        assert!(key.public_key().verify(b"same message", &first));
        assert!(key.public_key().verify(b"same message", &second));
    }

    #[test]
    fn entropy_failure_is_key_generation_error() {
        let err = SoftwareKeyProvider.generate_key_pair(&mut FailingRng).unwrap_err();
        assert!(matches!(err, CertError::KeyGenerationError(_)));
    }

    #[test]
    fn debug_output_hides_private_key() {
        let key = SoftwareKeyProvider
            .generate_key_pair(&mut StdRng::seed_from_u64(3))
            .unwrap();
        let printed = format!("{key:?}");
        assert!(printed.starts_with("SoftwareKeyPair"));
        assert!(!printed.contains("signing_key"));
    }
}
