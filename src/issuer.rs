use std::fs;
use std::path::Path;

use crate::cert::Certificate;
use crate::cert::params::{DistinguishedName, RootCaConfig};
use crate::error::{Result, RootCaError};
use crate::key::KeyPair;

/// A freshly issued root certificate together with its private key.
#[derive(Debug, Clone)]
pub struct IssuedRoot {
    pub certificate: Certificate,
    pub key: KeyPair,
}

impl IssuedRoot {
    /// The certificate as a `CERTIFICATE` PEM block.
    pub fn cert_pem(&self) -> Result<String> {
        self.certificate.to_pem()
    }

    /// The private key as an `EC PRIVATE KEY` PEM block.
    pub fn key_pem(&self) -> Result<String> {
        self.key.to_pem()
    }

    /// Writes the certificate and key PEM files.
    ///
    /// Parent directories must already exist. An existing file is replaced.
    pub fn persist(&self, cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<()> {
        let cert_path = cert_path.as_ref();
        let key_path = key_path.as_ref();

        fs::write(cert_path, self.cert_pem()?)
            .map_err(|e| RootCaError::storage(cert_path, e))?;
        fs::write(key_path, self.key_pem()?).map_err(|e| RootCaError::storage(key_path, e))?;

        tracing::info!(
            cert = %cert_path.display(),
            key = %key_path.display(),
            "persisted root certificate and key"
        );
        Ok(())
    }
}

/// Generates a key pair and a self-signed root certificate for it.
///
/// # Arguments
/// * `config` - Curve, subject, validity and constraints of the root.
///
/// # Returns
/// The signed certificate and the key that signed it. Nothing is written to
/// disk; see [`IssuedRoot::persist`].
pub fn issue_self_signed_root(config: &RootCaConfig) -> Result<IssuedRoot> {
    tracing::debug!(
        curve = %config.curve,
        subject = %config.subject.common_name,
        "issuing self-signed root"
    );

    let key = KeyPair::generate(config.curve)?;
    let certificate = Certificate::new_self_signed(config, &key)?;

    let validity = certificate.validity();
    tracing::info!(
        subject = %config.subject.common_name,
        serial = %hex::encode(certificate.serial_number()),
        not_after = %validity.not_after,
        "issued self-signed root certificate"
    );

    Ok(IssuedRoot { certificate, key })
}

/// Issues a root with the default profile, overriding subject, lifetime and path length.
pub fn issue_self_signed_root_with(
    subject: DistinguishedName,
    validity_years: u32,
    max_path_len: u8,
) -> Result<IssuedRoot> {
    let config = RootCaConfig::builder()
        .subject(subject)
        .validity_years(validity_years)
        .max_path_len(max_path_len)
        .build();
    issue_self_signed_root(&config)
}
