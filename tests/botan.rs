mod util;

use botan::Certificate as BotanCertificate;
use paircert::cert::params::AlgorithmParameters;

fn check_cert(cert_der: &[u8]) {
    // Use botan crate to parse the DER and assert it succeeds
    BotanCertificate::load(cert_der).expect("Botan failed to parse certificate");
}

#[test]
#[ignore]
fn test_botan_null_absent() {
    let issued = util::issue_pairing_cert(AlgorithmParameters::Absent, 60);
    check_cert(issued.cert.as_bytes());
}

#[test]
#[ignore]
fn test_botan_null_present() {
    let issued = util::issue_pairing_cert(AlgorithmParameters::Null, 61);
    check_cert(issued.cert.as_bytes());
}
