use std::path::{Path, PathBuf};

use rootca::cert::params::{DistinguishedName, RootCaConfig};
use rootca::issuer::{IssuedRoot, issue_self_signed_root};

pub fn example_subject() -> DistinguishedName {
    DistinguishedName::builder()
        .common_name("ca.example.com".to_string())
        .organization("Example Corp".to_string())
        .country("US".to_string())
        .build()
}

pub fn generate_ca_cert() -> IssuedRoot {
    let config = RootCaConfig::builder()
        .subject(example_subject())
        .validity_years(15)
        .max_path_len(1)
        .build();
    issue_self_signed_root(&config).unwrap()
}

/// Persists `root` under `dir` and returns the certificate and key paths.
#[allow(dead_code)]
pub fn persist_in(root: &IssuedRoot, dir: &Path) -> (PathBuf, PathBuf) {
    let cert_path = dir.join("ca-cert.pem");
    let key_path = dir.join("ca-key.pem");
    root.persist(&cert_path, &key_path).unwrap();
    (cert_path, key_path)
}
