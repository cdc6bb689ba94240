mod util;

use std::fs;

use rootca::cert::extensions::{BasicConstraints, KeyUsages};
use rootca::cert::params::RootCaConfig;
use rootca::error::RootCaError;
use rootca::issuer::{issue_self_signed_root, issue_self_signed_root_with};
use rootca::key::{Curve, KeyPair};
use rootca::loader::{load_key_pair, load_pair};
use rootca::pem;
use time::OffsetDateTime;

/// Issues a root, persists it, and reloads it through the loader.
#[test]
fn issue_persist_and_reload_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = util::generate_ca_cert();
    let (cert_path, key_path) = util::persist_in(&root, dir.path());

    let cert = load_pair(&cert_path, &key_path).unwrap();
    assert_eq!(cert.subject().common_name, "ca.example.com");
    assert!(cert.is_ca().unwrap());
    assert_eq!(
        cert.basic_constraints().unwrap(),
        Some(BasicConstraints {
            is_ca: true,
            max_path_length: Some(1),
        })
    );
    let key_usage = cert.key_usage().unwrap().unwrap();
    assert!(key_usage.contains(KeyUsages::KeyCertSign));
    assert!(key_usage.contains(KeyUsages::CRLSign));
    assert!(cert.verify_self_signed().unwrap());
    assert_eq!(cert, root.certificate);
}

/// The persisted certificate decodes to exactly the DER that was signed.
#[test]
fn persisted_certificate_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let root = util::generate_ca_cert();
    let (cert_path, key_path) = util::persist_in(&root, dir.path());

    let text = fs::read_to_string(&cert_path).unwrap();
    let der = pem::decode(&text, pem::CERTIFICATE_LABEL).unwrap();
    assert_eq!(der, root.certificate.to_der().unwrap());

    let key_text = fs::read_to_string(&key_path).unwrap();
    let key_der = pem::decode(&key_text, pem::EC_PRIVATE_KEY_LABEL).unwrap();
    assert_eq!(key_der, root.key.to_sec1_der().unwrap());
}

#[test]
fn validity_spans_configured_years() {
    let before = OffsetDateTime::now_utc();
    let root = util::generate_ca_cert();
    let validity = root.certificate.validity();

    assert!(validity.not_after > validity.not_before);
    assert!((validity.not_before - before).abs() < time::Duration::seconds(2));
    assert_eq!(validity.not_after.year() - validity.not_before.year(), 15);
    assert_eq!(validity.not_after.time(), validity.not_before.time());
    let days = validity.duration().whole_days();
    assert!((15 * 365..=15 * 365 + 4).contains(&days), "{days} days");
}

#[test]
fn rapid_issuance_yields_distinct_serials() {
    let first = issue_self_signed_root(&RootCaConfig::default()).unwrap();
    let second = issue_self_signed_root(&RootCaConfig::default()).unwrap();
    assert_ne!(
        first.certificate.serial_number(),
        second.certificate.serial_number()
    );
}

#[test]
fn root_does_not_verify_under_foreign_key() {
    let root = util::generate_ca_cert();
    let foreign = KeyPair::generate(Curve::P256).unwrap();
    assert!(
        root.certificate
            .verify_signature(&root.key.public_key())
            .unwrap()
    );
    assert!(!root.certificate.verify_signature(&foreign.public_key()).unwrap());
}

#[test]
fn mismatched_key_is_malformed_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let root = util::generate_ca_cert();
    let (cert_path, key_path) = util::persist_in(&root, dir.path());

    let stranger = KeyPair::generate(Curve::P256).unwrap();
    fs::write(&key_path, stranger.to_pem().unwrap()).unwrap();

    assert!(matches!(
        load_pair(&cert_path, &key_path),
        Err(RootCaError::MalformedArtifact(_))
    ));
}

#[test]
fn key_on_other_curve_is_malformed_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let root = util::generate_ca_cert();
    let (cert_path, key_path) = util::persist_in(&root, dir.path());

    let stranger = KeyPair::generate(Curve::P384).unwrap();
    fs::write(&key_path, stranger.to_pem().unwrap()).unwrap();

    assert!(matches!(
        load_pair(&cert_path, &key_path),
        Err(RootCaError::MalformedArtifact(_))
    ));
}

#[test]
fn missing_input_touches_no_files() {
    assert!(matches!(load_pair("", ""), Err(RootCaError::MissingInput)));
    assert!(matches!(
        load_key_pair("", ""),
        Err(RootCaError::MissingInput)
    ));
}

#[test]
fn absent_files_are_storage_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_pair(dir.path().join("nope.pem"), dir.path().join("nada.pem")).unwrap_err();
    match err {
        RootCaError::Storage { path, .. } => assert!(path.ends_with("nope.pem")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn swapped_files_are_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let root = util::generate_ca_cert();
    let (cert_path, key_path) = util::persist_in(&root, dir.path());

    assert!(matches!(
        load_pair(&key_path, &cert_path),
        Err(RootCaError::MalformedArtifact(_))
    ));
}

#[test]
fn chain_file_returns_leaf_first() {
    let dir = tempfile::tempdir().unwrap();
    let leaf = util::generate_ca_cert();
    let other = issue_self_signed_root(&RootCaConfig::default()).unwrap();
    let (cert_path, key_path) = util::persist_in(&leaf, dir.path());

    let chain = format!(
        "{}{}",
        leaf.cert_pem().unwrap(),
        other.cert_pem().unwrap()
    );
    fs::write(&cert_path, chain).unwrap();

    let loaded = load_key_pair(&cert_path, &key_path).unwrap();
    assert_eq!(loaded.leaf(), &leaf.certificate);
    assert_eq!(loaded.intermediates(), &[other.certificate.clone()]);
    assert_eq!(
        load_pair(&cert_path, &key_path).unwrap().subject().common_name,
        "ca.example.com"
    );
}

#[test]
fn default_profile_keeps_non_ascii_subject() {
    let dir = tempfile::tempdir().unwrap();
    let root = issue_self_signed_root(&RootCaConfig::default()).unwrap();
    let (cert_path, key_path) = util::persist_in(&root, dir.path());

    let subject = load_pair(&cert_path, &key_path).unwrap().subject();
    assert_eq!(subject.common_name, "ca.org1.example.com");
    assert_eq!(subject.country.as_deref(), Some("CN"));
    assert_eq!(subject.state.as_deref(), Some("北京"));
    assert_eq!(subject.locality.as_deref(), Some("北京"));
    assert_eq!(subject.organization.as_deref(), Some("org1.example.com"));
}

/// A zero path length is dropped unless the companion flag asks for it.
#[test]
fn zero_path_len_depends_on_companion_flag() {
    let unset = issue_self_signed_root_with(util::example_subject(), 1, 0).unwrap();
    assert_eq!(
        unset
            .certificate
            .basic_constraints()
            .unwrap()
            .unwrap()
            .max_path_length,
        None
    );

    let config = RootCaConfig::builder()
        .subject(util::example_subject())
        .max_path_len(0)
        .max_path_len_zero(true)
        .build();
    let explicit = issue_self_signed_root(&config).unwrap();
    assert_eq!(
        explicit
            .certificate
            .basic_constraints()
            .unwrap()
            .unwrap()
            .max_path_length,
        Some(0)
    );
}

#[test]
fn subject_alt_names_are_optional() {
    let config = RootCaConfig::builder()
        .subject(util::example_subject())
        .dns_names(vec!["ca.example.com".to_string()])
        .ip_addresses(vec!["127.0.0.1".parse().unwrap()])
        .build();
    let root = issue_self_signed_root(&config).unwrap();
    let san = root.certificate.subject_alt_name().unwrap().unwrap();
    assert_eq!(san.dns_names, vec!["ca.example.com".to_string()]);
    assert_eq!(san.ip_addresses, vec!["127.0.0.1".parse::<std::net::IpAddr>().unwrap()]);

    let bare = util::generate_ca_cert();
    assert!(bare.certificate.subject_alt_name().unwrap().is_none());
}

#[test]
fn p384_root_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let config = RootCaConfig::builder()
        .curve(Curve::P384)
        .subject(util::example_subject())
        .build();
    let root = issue_self_signed_root(&config).unwrap();
    let (cert_path, key_path) = util::persist_in(&root, dir.path());

    let loaded = load_key_pair(&cert_path, &key_path).unwrap();
    assert_eq!(loaded.key().curve(), Curve::P384);
    assert!(loaded.leaf().verify_self_signed().unwrap());
}

#[test]
fn binary_key_file_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let root = util::generate_ca_cert();
    let (cert_path, key_path) = util::persist_in(&root, dir.path());
    fs::write(&key_path, [0x30, 0x81, 0xff, 0xfe, 0x80]).unwrap();

    assert!(matches!(
        load_pair(&cert_path, &key_path),
        Err(RootCaError::MalformedArtifact(_))
    ));
}

#[test]
fn key_without_curve_parameter_loads() {
    let dir = tempfile::tempdir().unwrap();
    let root = util::generate_ca_cert();
    let (cert_path, key_path) = util::persist_in(&root, dir.path());

    let KeyPair::EcdsaP256 { signing_key, .. } = &root.key else {
        panic!("default root key is P-256");
    };
    let bare = p256::SecretKey::from(signing_key.as_nonzero_scalar())
        .to_sec1_der()
        .unwrap();
    fs::write(&key_path, pem::encode(pem::EC_PRIVATE_KEY_LABEL, &bare)).unwrap();

    let loaded = load_key_pair(&cert_path, &key_path).unwrap();
    assert_eq!(loaded.key().public_key(), root.key.public_key());
}
