use std::net::IpAddr;
use std::time::SystemTime;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, GeneralizedTime, OctetString, PrintableStringRef, SetOfVec, UtcTime, Utf8StringRef};
use der::{Tag, Tagged};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use super::extensions::{KeyUsage, ToAndFromX509Extension};
use crate::error::{Result, RootCaError};
use crate::key::Curve;

const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const STATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const ORGANIZATION_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Validity period of a root certificate unless configured otherwise.
pub const DEFAULT_VALIDITY_YEARS: u32 = 15;
/// Path length of a root certificate unless configured otherwise.
pub const DEFAULT_MAX_PATH_LEN: u8 = 1;

/// Distinguished name parameters for building an X.509 certificate.
///
/// This struct represents the subject or issuer name in a certificate.
/// Attributes are written in the order C, ST, L, O, OU, CN and absent ones
/// are left out.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// The country is written as a PrintableString and everything else as a
    /// UTF8String, so non-ASCII names survive unchanged.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        let attributes = [
            (COUNTRY, self.country.as_deref()),
            (STATE, self.state.as_deref()),
            (LOCALITY, self.locality.as_deref()),
            (ORGANIZATION, self.organization.as_deref()),
            (ORGANIZATION_UNIT, self.organization_unit.as_deref()),
            (COMMON_NAME, Some(self.common_name.as_str())),
        ];

        let mut rdns = Vec::new();
        for (oid, value) in attributes {
            let Some(value) = value else { continue };
            let value = if oid == COUNTRY {
                PrintableStringRef::new(value).map_err(|e| {
                    RootCaError::InvalidInput(format!("country {value:?} is not printable: {e}"))
                })?;
                Any::new(Tag::PrintableString, value.as_bytes())
            } else {
                Utf8StringRef::new(value).map_err(|e| {
                    RootCaError::InvalidInput(format!("name attribute {value:?}: {e}"))
                })?;
                Any::new(Tag::Utf8String, value.as_bytes())
            }
            .map_err(|e| RootCaError::InvalidInput(e.to_string()))?;

            let mut set = SetOfVec::new();
            set.insert_ordered(AttributeTypeAndValue { oid, value })
                .map_err(|e| RootCaError::InvalidInput(e.to_string()))?;
            rdns.push(RelativeDistinguishedName::from(set));
        }

        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes this type does not model are ignored. When an attribute
    /// repeats, the last value wins.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = attribute_string(&attr.value) else {
                    continue;
                };
                match attr.oid {
                    COMMON_NAME => dn.common_name = value,
                    COUNTRY => dn.country = Some(value),
                    STATE => dn.state = Some(value),
                    LOCALITY => dn.locality = Some(value),
                    ORGANIZATION => dn.organization = Some(value),
                    ORGANIZATION_UNIT => dn.organization_unit = Some(value),
                    _ => {}
                }
            }
        }

        dn
    }
}

fn attribute_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
            std::str::from_utf8(value.value()).ok().map(str::to_owned)
        }
        _ => None,
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
/// Both ends are whole seconds, matching what the DER encoding can carry.
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
    /// Creates a validity period starting now and ending on the same calendar
    /// instant `years` later. A start on February 29 ends on March 1.
    pub fn for_years(years: u32) -> Result<Self> {
        Self::years_from(now_whole_seconds(), years)
    }

    pub(crate) fn years_from(not_before: OffsetDateTime, years: u32) -> Result<Self> {
        if years == 0 {
            return Err(RootCaError::InvalidInput(
                "validity must be at least one year".to_string(),
            ));
        }
        let out_of_range =
            |e: time::error::ComponentRange| RootCaError::InvalidInput(format!("validity: {e}"));
        let year = i32::try_from(years)
            .ok()
            .and_then(|years| not_before.year().checked_add(years))
            .ok_or_else(|| RootCaError::InvalidInput(format!("validity of {years} years")))?;
        let not_after = match not_before.replace_year(year) {
            Ok(not_after) => not_after,
            Err(_) => {
                not_before
                    .replace_day(28)
                    .and_then(|date| date.replace_year(year))
                    .map_err(out_of_range)?
                    + Duration::days(1)
            }
        };
        Ok(Self {
            not_before,
            not_after,
        })
    }

    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.not_before <= instant && instant <= self.not_after
    }

    pub(crate) fn to_x509_validity(&self) -> der::Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }

    pub(crate) fn from_x509_validity(validity: &x509_cert::time::Validity) -> Self {
        Self {
            not_before: OffsetDateTime::from(validity.not_before.to_system_time()),
            not_after: OffsetDateTime::from(validity.not_after.to_system_time()),
        }
    }
}

fn now_whole_seconds() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now - Duration::nanoseconds(i64::from(now.nanosecond()))
}

/// RFC 5280 wants UTCTime through 2049 and GeneralizedTime afterwards.
fn to_x509_time(instant: OffsetDateTime) -> der::Result<x509_cert::time::Time> {
    let system_time: SystemTime = instant.into();
    if instant.year() < 2050 {
        Ok(x509_cert::time::Time::UtcTime(UtcTime::from_system_time(
            system_time,
        )?))
    } else {
        Ok(x509_cert::time::Time::GeneralTime(
            GeneralizedTime::from_system_time(system_time)?,
        ))
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }

    pub(crate) fn to_x509_extension(&self) -> der::Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.as_slice())?,
        })
    }
}

/// Everything needed to mint a self-signed root certificate.
///
/// The defaults describe `ca.org1.example.com`, valid for fifteen years on
/// P-256, allowed to sign one level of intermediates.
///
/// # Fields
/// * `curve` - Named curve of the generated key.
/// * `subject` - Subject, and therefore issuer, of the certificate.
/// * `validity_years` - Years between `notBefore` and `notAfter`.
/// * `max_path_len` - Intermediate CAs allowed below the root.
/// * `max_path_len_zero` - Emit a `max_path_len` of zero instead of dropping it.
/// * `key_usage` - Key usage bits, certificate and CRL signing by default.
/// * `dns_names` / `ip_addresses` - Optional subject alternative names.
#[derive(Clone, Debug, Builder)]
pub struct RootCaConfig {
    #[builder(default)]
    pub curve: Curve,
    #[builder(default = default_subject())]
    pub subject: DistinguishedName,
    #[builder(default = DEFAULT_VALIDITY_YEARS)]
    pub validity_years: u32,
    #[builder(default = DEFAULT_MAX_PATH_LEN)]
    pub max_path_len: u8,
    #[builder(default)]
    pub max_path_len_zero: bool,
    #[builder(default = KeyUsage::certificate_authority())]
    pub key_usage: KeyUsage,
    #[builder(default)]
    pub dns_names: Vec<String>,
    #[builder(default)]
    pub ip_addresses: Vec<IpAddr>,
}

impl Default for RootCaConfig {
    fn default() -> Self {
        RootCaConfig::builder().build()
    }
}

/// Subject used when none is configured.
pub fn default_subject() -> DistinguishedName {
    DistinguishedName::builder()
        .common_name("ca.org1.example.com".to_string())
        .country("CN".to_string())
        .state("北京".to_string())
        .locality("北京".to_string())
        .organization("org1.example.com".to_string())
        .build()
}
