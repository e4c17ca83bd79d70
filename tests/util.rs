use paircert::cert::params::{AlgorithmParameters, IssuanceParams};
use paircert::issuer::{CertificateWithKey, issue_self_signed};
use paircert::key::{SoftwareKeyPair, SoftwareKeyProvider};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn issue_pairing_cert(
    parameters: AlgorithmParameters,
    seed: u64,
) -> CertificateWithKey<SoftwareKeyPair> {
    let params = IssuanceParams::builder()
        .common_name("HealthSync Local")
        .parameters(parameters)
        .build();
    issue_self_signed(&SoftwareKeyProvider, &params, &mut seeded_rng(seed))
        .expect("issuance failed")
}
