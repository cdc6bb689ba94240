use der::Encode;
use der::asn1::BitString;
use x509_cert::Version;
use x509_cert::serial_number::SerialNumber;

use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::{Result, RootCaError};
use crate::key::{KeyPair, PublicKey};

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// This is the certificate template: built fresh for one issuance, consumed
/// by [`TbsCertificate::sign`], then dropped.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The `notBefore`/`notAfter` window.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    /// Certificate serial number, big-endian
    pub serial_number: Vec<u8>,
    /// Certificate signature algorithm
    pub signature_algorithm: SignatureAlgorithm,
    /// Certificate issuer distinguished name
    pub issuer: DistinguishedName,
    pub validity: Validity,
    /// Certificate subject distinguished name
    pub subject: DistinguishedName,
    /// Subject's public key
    pub subject_public_key: PublicKey,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

fn template_error(field: &str, err: der::Error) -> RootCaError {
    RootCaError::SigningFailure(format!("invalid {field}: {err}"))
}

impl TbsCertificate {
    /// Converts the template into `x509_cert`'s structure for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<x509_cert::TbsCertificate> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509_extension)
            .collect::<der::Result<Vec<_>>>()
            .map_err(|e| template_error("extension", e))?;

        let validity = self
            .validity
            .to_x509_validity()
            .map_err(|e| template_error("validity", e))?;

        let serial_number = SerialNumber::new(self.serial_number.as_slice())
            .map_err(|e| template_error("serial number", e))?;

        Ok(x509_cert::TbsCertificate {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.as_x509_name()?,
            validity,
            subject: self.subject.as_x509_name()?,
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Encodes the template into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.to_tbs_certificate_inner()?
            .to_der()
            .map_err(|e| template_error("TBS certificate", e))
    }

    /// Signs the template with `key`, consuming it.
    ///
    /// `key` must be the issuer's key and match `signature_algorithm`.
    pub fn sign(self, key: &KeyPair) -> Result<Certificate> {
        if key.signature_algorithm() != self.signature_algorithm {
            return Err(RootCaError::SigningFailure(format!(
                "{:?} key cannot produce {:?}",
                key.curve(),
                self.signature_algorithm
            )));
        }

        let tbs_certificate = self.to_tbs_certificate_inner()?;
        let tbs_der = tbs_certificate
            .to_der()
            .map_err(|e| template_error("TBS certificate", e))?;
        let signature = key.sign(&tbs_der)?;

        let inner = x509_cert::Certificate {
            tbs_certificate,
            signature_algorithm: self.signature_algorithm.into(),
            signature: BitString::from_bytes(&signature)
                .map_err(|e| template_error("signature", e))?,
        };

        Ok(Certificate { inner })
    }
}
