use time::OffsetDateTime;

use crate::asn1::{self, Value};
use crate::cert::SignatureAlgorithm;
use crate::cert::params::Validity;
use crate::error::CertError;
use crate::key::{PublicKey, UNCOMPRESSED_POINT_LEN};

pub type Result<T> = std::result::Result<T, CertError>;

/// ecdsa-with-SHA256 (RFC 5758)
pub const ECDSA_WITH_SHA256: [u64; 7] = [1, 2, 840, 10045, 4, 3, 2];
/// id-ecPublicKey (RFC 5480)
pub const ID_EC_PUBLIC_KEY: [u64; 6] = [1, 2, 840, 10045, 2, 1];
/// prime256v1 / secp256r1
pub const PRIME256V1: [u64; 7] = [1, 2, 840, 10045, 3, 1, 7];
/// id-at-commonName
pub const COMMON_NAME: [u64; 4] = [2, 5, 4, 3];

/// `Version ::= INTEGER { v1(0), v2(1), v3(2) }`
const VERSION_V3: u64 = 2;

/// Represents the "To Be Signed" (TBS) portion of a self-signed pairing certificate.
///
/// Issuer and subject both come from `common_name`; there is no way to give
/// them different values.
///
/// # Fields
/// * `serial_number` - Positive certificate serial number.
/// * `signature_algorithm` - Algorithm identifier repeated outside the TBS.
/// * `common_name` - Subject and issuer common name.
/// * `validity` - The notBefore/notAfter window.
/// * `subject_public_key` - Public key placed in subjectPublicKeyInfo.
#[derive(Clone, Debug)]
pub struct TbsCertificate {
    pub serial_number: u64,
    pub signature_algorithm: SignatureAlgorithm,
    pub common_name: String,
    pub validity: Validity,
    pub subject_public_key: PublicKey,
}

impl TbsCertificate {
    /// Encodes the `TbsCertificate` into DER format.
    ///
    /// # Returns
    /// The exact bytes that get signed.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        build_tbs(
            self.serial_number,
            &self.subject_public_key.to_uncompressed_point(),
            self.validity.not_before,
            self.validity.not_after,
            &self.common_name,
            self.signature_algorithm,
        )
    }
}

/// Assembles the DER TBSCertificate.
///
/// Field order is fixed by RFC 5280: version, serial, signature, issuer,
/// validity, subject, subjectPublicKeyInfo. `public_key` must be an
/// uncompressed P-256 point.
///
/// # Errors
/// Every failure, including those of the DER encoder, is reported as
/// [`CertError::CertificateBuildError`].
pub fn build_tbs(
    serial: u64,
    public_key: &[u8],
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
    common_name: &str,
    algorithm: SignatureAlgorithm,
) -> Result<Vec<u8>> {
    assemble_tbs(serial, public_key, not_before, not_after, common_name, algorithm)
        .map(|tbs| tbs.to_der())
        .map_err(CertError::into_build_error)
}

fn assemble_tbs(
    serial: u64,
    public_key: &[u8],
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
    common_name: &str,
    algorithm: SignatureAlgorithm,
) -> Result<Value> {
    if serial == 0 {
        return Err(CertError::CertificateBuildError(
            "serial number must be positive".to_string(),
        ));
    }
    if not_after <= not_before {
        return Err(CertError::CertificateBuildError(
            "notAfter must be later than notBefore".to_string(),
        ));
    }

    let version = asn1::context_specific(0, asn1::integer(VERSION_V3));
    let name = distinguished_name(common_name)?;
    let validity = asn1::sequence(vec![
        asn1::utc_time(not_before)?,
        asn1::utc_time(not_after)?,
    ]);

    Ok(asn1::sequence(vec![
        version,
        asn1::integer(serial),
        algorithm.algorithm_identifier()?,
        name.clone(),
        validity,
        name,
        subject_public_key_info(public_key)?,
    ]))
}

/// `Name ::= SEQUENCE OF SET OF AttributeTypeAndValue`, holding a single CN.
pub fn distinguished_name(common_name: &str) -> Result<Value> {
    Ok(asn1::sequence(vec![asn1::set(vec![asn1::sequence(vec![
        asn1::object_identifier(&COMMON_NAME)?,
        asn1::utf8_string(common_name),
    ])])]))
}

fn subject_public_key_info(public_key: &[u8]) -> Result<Value> {
    if public_key.len() != UNCOMPRESSED_POINT_LEN || public_key[0] != 0x04 {
        return Err(CertError::CertificateBuildError(format!(
            "expected a {UNCOMPRESSED_POINT_LEN}-byte uncompressed P-256 point, got {} bytes",
            public_key.len()
        )));
    }
    let algorithm = asn1::sequence(vec![
        asn1::object_identifier(&ID_EC_PUBLIC_KEY)?,
        asn1::object_identifier(&PRIME256V1)?,
    ]);
    Ok(asn1::sequence(vec![algorithm, asn1::bit_string(public_key)]))
}
