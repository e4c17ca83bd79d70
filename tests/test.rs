mod util;

use der::{Decode, Encode};
use paircert::cert::params::{AlgorithmParameters, IssuanceParams};
use paircert::cert::{Certificate, SignatureAlgorithm, build_certificate};
use paircert::error::CertError;
use paircert::key::{KeyProvider, SigningKeyPair, SoftwareKeyProvider};
use paircert::tbs_certificate::build_tbs;
use paircert::validator::{self, RejectionReason};
use time::OffsetDateTime;
use time::macros::datetime;

pub type Result<T> = std::result::Result<T, CertError>;

/// Serial 1, 365 days, NULL absent in both identifiers: accepted, subject is the CN.
#[test]
fn healthsync_local_serial_one_is_accepted() -> Result<()> {
    let mut rng = util::seeded_rng(2026);
    let key = SoftwareKeyProvider.generate_key_pair(&mut rng)?;
    let params = IssuanceParams::builder()
        .common_name("HealthSync Local")
        .serial(0x1)
        .validity_days(365)
        .parameters(AlgorithmParameters::Absent)
        .build();
    let cert = Certificate::new_self_signed(&params, &key, &mut rng)?;

    let acceptance = validator::validate(cert.as_bytes());
    let summary = acceptance.summary().expect("certificate rejected");
    assert!(summary.subject.contains("HealthSync Local"));
    assert_eq!(summary.serial_number, "01");
    assert_eq!(
        summary.not_after - summary.not_before,
        time::Duration::days(365)
    );
    Ok(())
}

/// NULL in the TBS identifier but not in the outer one.
#[test]
fn mismatched_convention_is_rejected() -> Result<()> {
    let mut rng = util::seeded_rng(17);
    let key = SoftwareKeyProvider.generate_key_pair(&mut rng)?;
    let now = OffsetDateTime::now_utc();
    let tbs = build_tbs(
        0x1,
        &key.public_key().to_uncompressed_point(),
        now,
        now + time::Duration::days(365),
        "HealthSync Local",
        SignatureAlgorithm::EcdsaWithSha256(AlgorithmParameters::Null),
    )?;
    let signature = key.sign(&mut rng, &tbs)?;
    let cert = build_certificate(
        &tbs,
        SignatureAlgorithm::EcdsaWithSha256(AlgorithmParameters::Absent),
        &signature,
    )?;

    let acceptance = validator::validate(cert.as_bytes());
    let rejection = acceptance.rejection().expect("mismatch accepted");
    assert_eq!(rejection.reason, RejectionReason::AlgorithmMismatch);
    assert!(rejection.prefix_hex.starts_with("3082"));
    Ok(())
}

/// Same key, serial and window; each randomized signature is independently valid.
#[test]
fn repeated_issuance_is_accepted_each_time() -> Result<()> {
    let mut rng = util::seeded_rng(99);
    let key = SoftwareKeyProvider.generate_key_pair(&mut rng)?;
    let params = IssuanceParams::builder()
        .serial(0xDEAD_BEEF)
        .not_before(datetime!(2026-10-17 09:00:00 UTC))
        .build();

    let certs = (0..5)
        .map(|_| Certificate::new_self_signed(&params, &key, &mut rng))
        .collect::<Result<Vec<_>>>()?;
    for cert in &certs {
        assert!(validator::accepts(cert.as_bytes()));
    }
    assert_ne!(certs[0], certs[1]);
    Ok(())
}

#[test]
fn issuer_bytes_equal_subject_bytes() {
    for (seed, parameters) in [
        (1, AlgorithmParameters::Absent),
        (2, AlgorithmParameters::Null),
        (3, AlgorithmParameters::Absent),
    ] {
        let issued = util::issue_pairing_cert(parameters, seed);
        let parsed = x509_cert::Certificate::from_der(issued.cert.as_bytes()).unwrap();
        assert_eq!(
            parsed.tbs_certificate.issuer.to_der().unwrap(),
            parsed.tbs_certificate.subject.to_der().unwrap()
        );
    }
}

#[test]
fn inner_and_outer_algorithm_identifiers_match() {
    for parameters in [AlgorithmParameters::Absent, AlgorithmParameters::Null] {
        let issued = util::issue_pairing_cert(parameters, 5);
        let parsed = x509_cert::Certificate::from_der(issued.cert.as_bytes()).unwrap();
        assert_eq!(
            parsed.tbs_certificate.signature.to_der().unwrap(),
            parsed.signature_algorithm.to_der().unwrap()
        );
        assert_eq!(
            parsed.signature_algorithm.parameters.is_some(),
            parameters == AlgorithmParameters::Null
        );
    }
}

#[test]
fn certificate_carries_pairing_profile() {
    let issued = util::issue_pairing_cert(AlgorithmParameters::Absent, 8);
    let parsed = x509_cert::Certificate::from_der(issued.cert.as_bytes()).unwrap();
    let tbs = &parsed.tbs_certificate;

    assert_eq!(tbs.version, x509_cert::Version::V3);
    assert_eq!(tbs.signature.oid, const_oid::db::rfc5912::ECDSA_WITH_SHA_256);
    assert_eq!(
        tbs.subject_public_key_info.algorithm.oid,
        const_oid::db::rfc5912::ID_EC_PUBLIC_KEY
    );
    assert_eq!(
        tbs.subject_public_key_info.subject_public_key.raw_bytes(),
        &issued.key.public_key().to_uncompressed_point()[..]
    );
    assert!(tbs.extensions.is_none());
    assert!(tbs.serial_number.as_bytes().len() <= 9);
}

#[test]
fn pem_export_is_accepted() -> Result<()> {
    let issued = util::issue_pairing_cert(AlgorithmParameters::Absent, 13);
    let pem = issued.cert.to_pem();
    assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
    assert!(validator::validate_pem(&pem)?.is_accepted());
    assert_eq!(Certificate::from_pem(&pem)?, issued.cert);
    Ok(())
}

#[test]
fn out_of_range_validity_aborts_issuance() -> Result<()> {
    let mut rng = util::seeded_rng(31);
    let key = SoftwareKeyProvider.generate_key_pair(&mut rng)?;
    let params = IssuanceParams::builder()
        .not_before(datetime!(2049-12-01 00:00:00 UTC))
        .validity_days(365)
        .build();
    let err = Certificate::new_self_signed(&params, &key, &mut rng).unwrap_err();
    assert!(matches!(err, CertError::CertificateBuildError(_)));
    Ok(())
}

#[test]
fn oversized_validity_days_aborts_issuance() {
    let params = IssuanceParams::builder()
        .validity_days(i64::MAX / 1000)
        .build();
    let err = paircert::issuer::issue_self_signed(
        &SoftwareKeyProvider,
        &params,
        &mut util::seeded_rng(32),
    )
    .unwrap_err();
    assert!(matches!(err, CertError::CertificateBuildError(_)));
}

#[test]
fn os_rng_issuance_is_accepted() -> Result<()> {
    let issued = paircert::issuer::issue_self_signed(
        &SoftwareKeyProvider,
        &IssuanceParams::default(),
        &mut rand_core::OsRng,
    )?;
    assert!(validator::accepts(issued.cert.as_bytes()));
    Ok(())
}
