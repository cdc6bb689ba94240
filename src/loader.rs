//! Reloads a persisted certificate/key pair.

use std::fs;
use std::path::Path;

use crate::cert::Certificate;
use crate::error::{Result, RootCaError};
use crate::key::KeyPair;
use crate::pem;

/// A certificate chain and the private key of its leaf.
///
/// Only [`load_key_pair`] builds one, so the chain is never empty.
#[derive(Debug, Clone)]
pub struct CertifiedKey {
    leaf: Certificate,
    intermediates: Vec<Certificate>,
    key: KeyPair,
}

impl CertifiedKey {
    pub fn leaf(&self) -> &Certificate {
        &self.leaf
    }

    /// Certificates following the leaf in the certificate file, in file order.
    pub fn intermediates(&self) -> &[Certificate] {
        &self.intermediates
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    pub fn into_leaf(self) -> Certificate {
        self.leaf
    }
}

/// Loads a certificate chain and its private key, checking that they belong together.
///
/// The certificate file may hold several `CERTIFICATE` blocks; the first is
/// the leaf. The key file must hold an `EC PRIVATE KEY` or `PRIVATE KEY`
/// block whose public key equals the leaf's.
///
/// # Errors
/// * [`RootCaError::MissingInput`] if both paths are empty. Nothing is read.
/// * [`RootCaError::Storage`] if either file cannot be read.
/// * [`RootCaError::MalformedArtifact`] if either file does not parse, or the
///   key does not match the certificate.
pub fn load_key_pair(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<CertifiedKey> {
    let cert_path = cert_path.as_ref();
    let key_path = key_path.as_ref();
    if cert_path.as_os_str().is_empty() && key_path.as_os_str().is_empty() {
        return Err(RootCaError::MissingInput);
    }

    let cert_text = read_pem_file(cert_path)?;
    let key_text = read_pem_file(key_path)?;

    let mut chain = pem::decode_all(&cert_text, pem::CERTIFICATE_LABEL)?
        .iter()
        .map(|der| Certificate::from_der(der))
        .collect::<Result<Vec<_>>>()?;
    if chain.is_empty() {
        return Err(RootCaError::MalformedArtifact(format!(
            "no CERTIFICATE block in {}",
            cert_path.display()
        )));
    }
    let leaf = chain.remove(0);

    let key = KeyPair::from_pem(&key_text)?;

    let leaf_spki = leaf.public_key()?.spki_der()?;
    if key.public_key().spki_der()? != leaf_spki {
        tracing::warn!(
            cert = %cert_path.display(),
            key = %key_path.display(),
            "private key does not match certificate public key"
        );
        return Err(RootCaError::MalformedArtifact(
            "private key does not match certificate public key".to_string(),
        ));
    }

    tracing::debug!(
        cert = %cert_path.display(),
        chain_len = chain.len() + 1,
        subject = %leaf.subject().common_name,
        "loaded certificate and key"
    );
    Ok(CertifiedKey {
        leaf,
        intermediates: chain,
        key,
    })
}

/// Reads a PEM document. Content that is not text is malformed, not a storage failure.
fn read_pem_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| RootCaError::storage(path, e))?;
    String::from_utf8(bytes).map_err(|e| {
        RootCaError::MalformedArtifact(format!("{} is not PEM text: {e}", path.display()))
    })
}

/// Loads a certificate/key pair and returns the parsed leaf certificate.
///
/// See [`load_key_pair`] for the checks performed.
pub fn load_pair(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Result<Certificate> {
    Ok(load_key_pair(cert_path, key_path)?.into_leaf())
}
