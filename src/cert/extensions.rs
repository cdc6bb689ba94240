use std::net::IpAddr;

use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::name::GeneralName;

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

use crate::error::RootCaError;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use rootca::cert::extensions::{SubjectAltName, ToAndFromX509Extension};
/// let san = SubjectAltName { dns_names: vec!["example.com".to_string()], ip_addresses: vec![] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san, decoded);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, RootCaError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, RootCaError>
    where
        Self: Sized;
}

fn encoding_error(err: der::Error) -> RootCaError {
    RootCaError::SigningFailure(format!("cannot encode extension: {err}"))
}

fn decoding_error(err: der::Error) -> RootCaError {
    RootCaError::MalformedArtifact(format!("cannot decode extension: {err}"))
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Only DNS names and IP addresses are supported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltName {
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
}

impl SubjectAltName {
    pub fn is_empty(&self) -> bool {
        self.dns_names.is_empty() && self.ip_addresses.is_empty()
    }
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, RootCaError> {
        let mut names = self
            .dns_names
            .iter()
            .map(|name| {
                Ia5String::new(name)
                    .map(GeneralName::DnsName)
                    .map_err(|e| RootCaError::InvalidInput(format!("DNS name {name:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for ip in &self.ip_addresses {
            let octets = match ip {
                IpAddr::V4(v4) => v4.octets().to_vec(),
                IpAddr::V6(v6) => v6.octets().to_vec(),
            };
            names.push(GeneralName::IpAddress(
                OctetString::new(octets).map_err(encoding_error)?,
            ));
        }

        x509_cert::ext::pkix::SubjectAltName(names)
            .to_der()
            .map_err(encoding_error)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, RootCaError> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension).map_err(decoding_error)?;
        let mut decoded = SubjectAltName::default();
        for name in san.0.iter() {
            match name {
                GeneralName::DnsName(dns) => decoded.dns_names.push(dns.to_string()),
                GeneralName::IpAddress(octets) => {
                    let ip = match octets.as_bytes() {
                        [a, b, c, d] => IpAddr::from([*a, *b, *c, *d]),
                        bytes => <[u8; 16]>::try_from(bytes)
                            .map(IpAddr::from)
                            .map_err(|_| {
                                RootCaError::MalformedArtifact(format!(
                                    "IP address of {} bytes",
                                    bytes.len()
                                ))
                            })?,
                    };
                    decoded.ip_addresses.push(ip);
                }
                _ => {
                    return Err(RootCaError::MalformedArtifact(
                        "Unsupported general name type".to_string(),
                    ));
                }
            }
        }
        Ok(decoded)
    }
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and its path length.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed below this one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl BasicConstraints {
    /// Resolves a configured path length the way X.509 tooling traditionally does.
    ///
    /// A zero length only survives when `max_path_len_zero` is set; otherwise
    /// it is read as "no constraint configured".
    pub fn with_path_len(is_ca: bool, max_path_len: Option<u8>, max_path_len_zero: bool) -> Self {
        let max_path_length = match max_path_len {
            Some(0) if !max_path_len_zero => None,
            other => other,
        };
        Self {
            is_ca,
            max_path_length,
        }
    }
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, RootCaError> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        bc.to_der().map_err(encoding_error)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, RootCaError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes).map_err(decoding_error)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl KeyUsage {
    /// Certificate signing plus CRL signing, the usages of a root CA key.
    pub fn certificate_authority() -> Self {
        KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign)
    }

    pub fn contains(&self, usage: KeyUsages) -> bool {
        self.0.contains(usage)
    }
}

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, RootCaError> {
        X509KeyUsage(self.0).to_der().map_err(encoding_error)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, RootCaError> {
        let ku = X509KeyUsage::from_der(extension).map_err(decoding_error)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Subject Key Identifier extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, RootCaError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(
            OctetString::new(self.0.as_slice()).map_err(encoding_error)?,
        );
        ski.to_der().map_err(encoding_error)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, RootCaError> {
        let ski =
            x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension).map_err(decoding_error)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}
