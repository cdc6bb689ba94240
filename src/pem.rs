//! PEM framing for persisted certificates and keys.

use crate::error::{Result, RootCaError};

/// Label of a PEM block carrying a DER X.509 certificate.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
/// Label of a PEM block carrying a SEC1 `ECPrivateKey`.
pub const EC_PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";
/// Label of a PEM block carrying a PKCS#8 `PrivateKeyInfo`.
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// Convert DER-encoded data into a PEM-encoded string with the provided label.
///
/// Lines are wrapped at 64 columns and terminated with `\n`.
pub fn encode(label: &str, der: &[u8]) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Returns the payload of the first block labelled `label`.
pub fn decode(text: &str, label: &str) -> Result<Vec<u8>> {
    decode_all(text, label)?
        .into_iter()
        .next()
        .ok_or_else(|| RootCaError::MalformedArtifact(format!("no {label} block found")))
}

/// Returns the payloads of every block labelled `label`, in file order.
///
/// Blocks with other labels are skipped.
pub fn decode_all(text: &str, label: &str) -> Result<Vec<Vec<u8>>> {
    Ok(pem::parse_many(text)?
        .into_iter()
        .filter(|block| block.tag() == label)
        .map(|block| block.contents().to_vec())
        .collect())
}

/// Returns the label and payload of the first block whose label ends in `PRIVATE KEY`.
pub(crate) fn decode_private_key(text: &str) -> Result<(String, Vec<u8>)> {
    pem::parse_many(text)?
        .into_iter()
        .find(|block| block.tag() == PRIVATE_KEY_LABEL || block.tag().ends_with(" PRIVATE KEY"))
        .map(|block| (block.tag().to_string(), block.contents().to_vec()))
        .ok_or_else(|| RootCaError::MalformedArtifact("no private key block found".to_string()))
}
