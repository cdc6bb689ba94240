pub mod extensions;
pub mod params;

use der::{Decode, Encode};
use extensions::{
    BasicConstraints, KeyUsage, SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use params::{DistinguishedName, RootCaConfig, Validity};

use crate::error::{Result, RootCaError};
use crate::key::{KeyPair, PublicKey};
use crate::pem;
use crate::serial;
use crate::tbs_certificate::TbsCertificate;

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
}

impl SignatureAlgorithm {
    pub fn oid(self) -> const_oid::ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha256WithECDSA => const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
            SignatureAlgorithm::Sha384WithECDSA => const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
        }
    }
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// ECDSA algorithm identifiers carry no parameters (RFC 5758, 3.2).
    fn from(value: SignatureAlgorithm) -> Self {
        x509_cert::spki::AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters: None,
        }
    }
}

impl TryFrom<&x509_cert::spki::AlgorithmIdentifierOwned> for SignatureAlgorithm {
    type Error = RootCaError;

    fn try_from(value: &x509_cert::spki::AlgorithmIdentifierOwned) -> Result<Self> {
        match value.oid {
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => Ok(SignatureAlgorithm::Sha256WithECDSA),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_384 => Ok(SignatureAlgorithm::Sha384WithECDSA),
            other => Err(RootCaError::MalformedArtifact(format!(
                "unsupported signature algorithm: {other}"
            ))),
        }
    }
}

/// Represents a signed X.509 certificate.
///
/// Immutable once produced; encoding it to DER yields exactly the bytes that
/// were signed or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: x509_cert::Certificate,
}

impl Certificate {
    /// Creates a self-signed root certificate for `key` as described by `config`.
    ///
    /// The issuer equals the subject and the signature is made with `key`
    /// itself, so the result verifies against its own public key.
    pub fn new_self_signed(config: &RootCaConfig, key: &KeyPair) -> Result<Self> {
        let subject_public_key = key.public_key();
        let validity = Validity::for_years(config.validity_years)?;

        let basic_constraints = BasicConstraints::with_path_len(
            true,
            Some(config.max_path_len),
            config.max_path_len_zero,
        );
        let key_identifier = SubjectKeyIdentifier(subject_public_key.key_identifier()?);

        let mut extensions = vec![
            params::ExtensionParam::from_extension(basic_constraints, true)?,
            params::ExtensionParam::from_extension(config.key_usage, true)?,
            params::ExtensionParam::from_extension(key_identifier, false)?,
        ];

        let san = SubjectAltName {
            dns_names: config.dns_names.clone(),
            ip_addresses: config.ip_addresses.clone(),
        };
        if !san.is_empty() {
            extensions.push(params::ExtensionParam::from_extension(san, false)?);
        }

        let tbs_cert = TbsCertificate {
            serial_number: serial::generate()?.to_vec(),
            signature_algorithm: key.signature_algorithm(),
            issuer: config.subject.clone(),
            validity,
            subject: config.subject.clone(),
            subject_public_key,
            extensions,
        };

        tbs_cert.sign(key)
    }

    /// Parses a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = x509_cert::Certificate::from_der(der)
            .map_err(|e| RootCaError::MalformedArtifact(format!("invalid certificate: {e}")))?;
        Ok(Self { inner })
    }

    /// Parses the first `CERTIFICATE` block of a PEM document.
    pub fn from_pem(text: &str) -> Result<Self> {
        Self::from_der(&pem::decode(text, pem::CERTIFICATE_LABEL)?)
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| RootCaError::SigningFailure(format!("cannot encode certificate: {e}")))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        Ok(pem::encode(pem::CERTIFICATE_LABEL, &self.to_der()?))
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    /// Big-endian serial number, without any sign padding.
    pub fn serial_number(&self) -> Vec<u8> {
        let bytes = self.inner.tbs_certificate.serial_number.as_bytes();
        match bytes {
            [0, rest @ ..] if !rest.is_empty() => rest.to_vec(),
            _ => bytes.to_vec(),
        }
    }

    pub fn validity(&self) -> Validity {
        Validity::from_x509_validity(&self.inner.tbs_certificate.validity)
    }

    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::try_from(&self.inner.signature_algorithm)
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Decodes the extension `E`, or `None` if the certificate does not carry it.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
            .transpose()
    }

    pub fn basic_constraints(&self) -> Result<Option<BasicConstraints>> {
        self.extension()
    }

    /// True when the basic constraints extension marks this as a CA.
    pub fn is_ca(&self) -> Result<bool> {
        Ok(self.basic_constraints()?.is_some_and(|bc| bc.is_ca))
    }

    pub fn key_usage(&self) -> Result<Option<KeyUsage>> {
        self.extension()
    }

    pub fn subject_alt_name(&self) -> Result<Option<SubjectAltName>> {
        self.extension()
    }

    pub fn subject_key_identifier(&self) -> Result<Option<SubjectKeyIdentifier>> {
        self.extension()
    }

    /// Issuer and subject are the same name.
    pub fn is_self_issued(&self) -> bool {
        self.inner.tbs_certificate.issuer == self.inner.tbs_certificate.subject
    }

    /// Checks the certificate signature against `issuer_key`.
    ///
    /// Returns `Ok(false)` for a signature that does not verify and an error
    /// when the certificate cannot be checked at all.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<bool> {
        let algorithm = self.signature_algorithm()?;
        if self.inner.tbs_certificate.signature != self.inner.signature_algorithm {
            return Err(RootCaError::MalformedArtifact(
                "inner and outer signature algorithms differ".to_string(),
            ));
        }
        if algorithm != issuer_key.curve().signature_algorithm() {
            return Ok(false);
        }

        let tbs_der = self
            .inner
            .tbs_certificate
            .to_der()
            .map_err(|e| RootCaError::MalformedArtifact(format!("cannot encode TBS: {e}")))?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            RootCaError::MalformedArtifact("signature has unused bits".to_string())
        })?;

        Ok(issuer_key.verify(&tbs_der, signature))
    }

    /// Checks that the certificate is self-issued and signed by its own key.
    pub fn verify_self_signed(&self) -> Result<bool> {
        Ok(self.is_self_issued() && self.verify_signature(&self.public_key()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Curve;

    #[test]
    fn self_signed_root_verifies_only_under_own_key() {
        let key = KeyPair::generate_ecdsa_p256().unwrap();
        let cert = Certificate::new_self_signed(&RootCaConfig::default(), &key).unwrap();

        assert!(cert.is_self_issued());
        assert!(cert.verify_self_signed().unwrap());

        let stranger = KeyPair::generate_ecdsa_p256().unwrap();
        assert!(!cert.verify_signature(&stranger.public_key()).unwrap());
        let other_curve = KeyPair::generate_ecdsa_p384().unwrap();
        assert!(!cert.verify_signature(&other_curve.public_key()).unwrap());
    }

    #[test]
    fn tampered_certificate_fails_verification() {
        let key = KeyPair::generate_ecdsa_p256().unwrap();
        let mut cert = Certificate::new_self_signed(&RootCaConfig::default(), &key).unwrap();
        cert.inner.tbs_certificate.subject = DistinguishedName::builder()
            .common_name("mallory".to_string())
            .build()
            .as_x509_name()
            .unwrap();
        cert.inner.tbs_certificate.issuer = cert.inner.tbs_certificate.subject.clone();
        assert!(!cert.verify_self_signed().unwrap());
    }

    #[test]
    fn root_profile_extensions() {
        let config = RootCaConfig::builder().curve(Curve::P384).build();
        let key = KeyPair::generate(config.curve).unwrap();
        let cert = Certificate::new_self_signed(&config, &key).unwrap();

        assert_eq!(cert.inner.tbs_certificate.version, x509_cert::Version::V3);
        assert_eq!(
            cert.signature_algorithm().unwrap(),
            SignatureAlgorithm::Sha384WithECDSA
        );
        assert_eq!(
            cert.basic_constraints().unwrap(),
            Some(BasicConstraints {
                is_ca: true,
                max_path_length: Some(1)
            })
        );
        assert_eq!(cert.key_usage().unwrap(), Some(KeyUsage::certificate_authority()));
        assert_eq!(
            cert.subject_key_identifier().unwrap().unwrap().0,
            key.public_key().key_identifier().unwrap()
        );
        assert_eq!(cert.subject_alt_name().unwrap(), None);
        assert_eq!(cert.subject(), config.subject);
        assert_eq!(cert.issuer(), config.subject);

        let critical: Vec<bool> = cert
            .inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(|ext| ext.critical)
            .collect();
        assert_eq!(critical, vec![true, true, false]);
    }

    #[test]
    fn configured_path_length_reaches_certificate() {
        let key = KeyPair::generate_ecdsa_p256().unwrap();
        let path_len = |max_path_len, max_path_len_zero| {
            let config = RootCaConfig::builder()
                .max_path_len(max_path_len)
                .max_path_len_zero(max_path_len_zero)
                .build();
            Certificate::new_self_signed(&config, &key)
                .unwrap()
                .basic_constraints()
                .unwrap()
                .unwrap()
                .max_path_length
        };

        assert_eq!(path_len(1, false), Some(1));
        assert_eq!(path_len(3, false), Some(3));
        assert_eq!(path_len(0, false), None);
        assert_eq!(path_len(0, true), Some(0));
    }

    #[test]
    fn serial_number_is_positive_and_unpadded() {
        let key = KeyPair::generate_ecdsa_p256().unwrap();
        let cert = Certificate::new_self_signed(&RootCaConfig::default(), &key).unwrap();
        let serial = cert.serial_number();
        assert!(!serial.is_empty() && serial.len() <= serial::SERIAL_LEN);
        assert_eq!(serial[0] & 0x80, 0);
    }

    #[test]
    fn der_and_pem_reproduce_same_bytes() {
        let key = KeyPair::generate_ecdsa_p256().unwrap();
        let cert = Certificate::new_self_signed(&RootCaConfig::default(), &key).unwrap();
        let der = cert.to_der().unwrap();
        let reparsed = Certificate::from_pem(&cert.to_pem().unwrap()).unwrap();
        assert_eq!(reparsed.to_der().unwrap(), der);
        assert_eq!(reparsed, cert);
    }

    #[test]
    fn garbage_der_is_malformed() {
        assert!(matches!(
            Certificate::from_der(&[0x30, 0x03, 0x02, 0x01]),
            Err(RootCaError::MalformedArtifact(_))
        ));
    }
}
