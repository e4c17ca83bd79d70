//! Issues pairing certificates under each algorithm identifier convention and
//! reports which ones the acceptance validator takes.
//!
//! Set `RUST_LOG=debug` for the TBS sizes and rejection dumps.

use std::path::PathBuf;
use std::process::{Command, ExitCode, Stdio};

use paircert::cert::params::{AlgorithmParameters, IssuanceParams};
use paircert::cert::{Certificate, SignatureAlgorithm, build_certificate};
use paircert::error::CertError;
use paircert::key::{KeyProvider, SigningKeyPair, SoftwareKeyPair, SoftwareKeyProvider};
use paircert::tbs_certificate::build_tbs;
use paircert::validator::{self, Acceptance};
use rand_core::OsRng;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("Probe aborted: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool, CertError> {
    let mut rng = OsRng;
    let key = SoftwareKeyProvider.generate_key_pair(&mut rng)?;
    println!(
        "Key pair generated, public point {} bytes",
        key.public_key().to_uncompressed_point().len()
    );

    let mut default_accepted = false;
    for parameters in [AlgorithmParameters::Absent, AlgorithmParameters::Null] {
        let params = IssuanceParams::builder().parameters(parameters).build();
        let cert = Certificate::new_self_signed(&params, &key, &mut rng)?;
        let label = format!("{parameters:?} parameters");
        let accepted = report(&label, &cert);
        if parameters == AlgorithmParameters::default() {
            default_accepted = accepted;
        }
    }

    let mismatched = mismatched_certificate(&key)?;
    report("Null in TBS, Absent outside", &mismatched);

    reference_openssl_certificate();
    Ok(default_accepted)
}

/// Builds the certificate the issuance pipeline refuses to produce.
fn mismatched_certificate(key: &SoftwareKeyPair) -> Result<Certificate, CertError> {
    let params = IssuanceParams::default();
    let validity = params.validity()?;
    let tbs = build_tbs(
        0x1,
        &key.public_key().to_uncompressed_point(),
        validity.not_before,
        validity.not_after,
        &params.common_name,
        SignatureAlgorithm::EcdsaWithSha256(AlgorithmParameters::Null),
    )?;
    let signature = key.sign(&mut OsRng, &tbs)?;
    build_certificate(
        &tbs,
        SignatureAlgorithm::EcdsaWithSha256(AlgorithmParameters::Absent),
        &signature,
    )
}

fn report(label: &str, cert: &Certificate) -> bool {
    println!("{label} ({} bytes):", cert.as_bytes().len());
    match validator::validate(cert.as_bytes()) {
        Acceptance::Accepted(summary) => {
            println!("  ACCEPTED: {}", summary.subject);
            true
        }
        Acceptance::Rejected(rejection) => {
            println!("  REJECTED: {}", rejection.reason);
            println!("  First 64 bytes: {}", spaced_hex(&rejection.prefix_hex));
            false
        }
    }
}

fn spaced_hex(hex: &str) -> String {
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs `openssl req -x509` and feeds its certificate through the validator.
fn reference_openssl_certificate() {
    println!("Reference certificate from openssl:");
    let path: PathBuf = std::env::temp_dir().join("paircert_reference.der");
    let status = Command::new("openssl")
        .args([
            "req",
            "-new",
            "-x509",
            "-nodes",
            "-newkey",
            "ec",
            "-pkeyopt",
            "ec_paramgen_curve:prime256v1",
            "-keyout",
            "/dev/null",
            "-outform",
            "DER",
            "-days",
            "365",
            "-subj",
            "/CN=TestCert",
            "-out",
        ])
        .arg(&path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if !matches!(status, Ok(s) if s.success()) {
        println!("  could not run openssl");
        return;
    }
    match std::fs::read(&path) {
        Ok(der) => {
            let accepted = report("  openssl", &Certificate::from_der(der));
            if accepted {
                log::info!("openssl output passes the same checks");
            }
            if let Err(e) = std::fs::remove_file(&path) {
                log::debug!("Could not remove {}: {e}", path.display());
            }
        }
        Err(e) => println!("  could not read openssl output: {e}"),
    }
}
