use bon::Builder;
use time::Duration;
use time::OffsetDateTime;

use crate::error::CertError;

pub type Result<T> = std::result::Result<T, CertError>;

const SECONDS_PER_DAY: i64 = 86_400;

/// Common name used by the pairing flow when the caller does not pick one.
pub const DEFAULT_COMMON_NAME: &str = "HealthSync Local";

/// Lifetime of a pairing certificate, in days.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// How the ecdsa-with-SHA256 algorithm identifier carries its parameters.
///
/// RFC 5758 says the parameters field is absent for ECDSA, but some encoders
/// emit an explicit NULL the way RSA identifiers do. Parsers differ in what
/// they tolerate, so the convention is a setting. Whichever is chosen is
/// used for both the TBS and the outer identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlgorithmParameters {
    /// `SEQUENCE { OID }`
    #[default]
    Absent,
    /// `SEQUENCE { OID, NULL }`
    Null,
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    ///
    /// # Arguments
    /// * `days` - The number of days for the validity period.
    ///
    /// # Returns
    /// A `Validity` object, or `CertificateBuildError` if the end date overflows.
    pub fn for_days(days: i64) -> Result<Self> {
        Self::starting_at(OffsetDateTime::now_utc(), days)
    }

    /// Creates a validity period of `days` days beginning at `not_before`.
    pub fn starting_at(not_before: OffsetDateTime, days: i64) -> Result<Self> {
        let not_after = days
            .checked_mul(SECONDS_PER_DAY)
            .map(Duration::seconds)
            .and_then(|lifetime| not_before.checked_add(lifetime))
            .ok_or_else(|| {
                CertError::CertificateBuildError(format!(
                    "validity of {days} days from {not_before} is out of range"
                ))
            })?;
        Ok(Self {
            not_before,
            not_after,
        })
    }
}

/// Settings for one self-signed pairing certificate.
///
/// ```
/// use paircert::cert::params::{AlgorithmParameters, IssuanceParams};
///
/// let params = IssuanceParams::builder()
///     .common_name("Living Room Mac")
///     .parameters(AlgorithmParameters::Absent)
///     .build();
/// assert_eq!(params.validity_days, 365);
/// ```
#[derive(Clone, Debug, Builder)]
pub struct IssuanceParams {
    /// Subject and issuer common name.
    #[builder(into, default = DEFAULT_COMMON_NAME.to_string())]
    pub common_name: String,
    #[builder(default = DEFAULT_VALIDITY_DAYS)]
    pub validity_days: i64,
    /// NULL-parameter convention for the signature algorithm identifier.
    #[builder(default)]
    pub parameters: AlgorithmParameters,
    /// Start of validity; the current time when unset.
    pub not_before: Option<OffsetDateTime>,
    /// Fixed serial number; a random non-zero value when unset.
    pub serial: Option<u64>,
}

impl Default for IssuanceParams {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IssuanceParams {
    /// Resolves the validity window these parameters describe.
    pub fn validity(&self) -> Result<Validity> {
        match self.not_before {
            Some(not_before) => Validity::starting_at(not_before, self.validity_days),
            None => Validity::for_days(self.validity_days),
        }
    }
}
