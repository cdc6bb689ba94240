//! # rootca - Bootstrap a Root Certificate Authority in Pure Rust
//!
//! rootca generates an elliptic-curve key pair, builds a self-signed X.509 root
//! certificate for it, and persists both as PEM files. The reverse path loads a
//! certificate/key pair back from disk, checks that the two halves belong
//! together, and hands back the parsed certificate for inspection.
//!
//! It is built entirely with rustcrypto libraries (`x509-cert`, `der`, `p256`,
//! `p384`, `ecdsa`) and has no dependency on ring or openssl outside of tests.
//!
//! ## Supported Key Types
//!
//! - **ECDSA P-256** with SHA-256 (the default)
//! - **ECDSA P-384** with SHA-384
//!
//! ## Root Certificate Profile
//!
//! - Version 3, positive 16-byte serial number (counter plus random bytes)
//! - Issuer equal to subject, signed with the subject's own key
//! - `notBefore` is the issuance second, `notAfter` the same instant N years later
//! - Basic constraints `cA = TRUE` with a configurable path length (critical)
//! - Key usage `keyCertSign | cRLSign` (critical)
//! - Subject key identifier, and optional DNS/IP subject alternative names
//!
//! ## Quick Start
//!
//! ### Issuing and Persisting a Root
//!
//! ```rust,no_run
//! use rootca::{
//!     cert::params::{DistinguishedName, RootCaConfig},
//!     issuer::issue_self_signed_root,
//! };
//!
//! # fn main() -> Result<(), rootca::error::RootCaError> {
//! let subject = DistinguishedName::builder()
//!     .common_name("ca.example.com".to_string())
//!     .organization("Example Corp".to_string())
//!     .country("US".to_string())
//!     .build();
//!
//! let config = RootCaConfig::builder()
//!     .subject(subject)
//!     .validity_years(15)
//!     .max_path_len(1)
//!     .build();
//!
//! let root = issue_self_signed_root(&config)?;
//! root.persist("testdata/ca-cert.pem", "testdata/ca-key.pem")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Loading a Pair Back
//!
//! ```rust,no_run
//! use rootca::loader::load_pair;
//!
//! # fn main() -> Result<(), rootca::error::RootCaError> {
//! let cert = load_pair("testdata/ca-cert.pem", "testdata/ca-key.pem")?;
//! println!("subject CN: {}", cert.subject().common_name);
//! println!("is CA: {}", cert.is_ca()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible step returns a [`error::RootCaError`]; nothing in the library panics
//! or retries.
//!
//! ```rust
//! use rootca::{error::RootCaError, loader::load_pair};
//!
//! match load_pair("", "") {
//!     Err(RootCaError::MissingInput) => println!("nothing to load"),
//!     Err(e) => println!("Other error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: Key generation, signing, and SEC1/PKCS#8 import/export
//! - [`cert`]: Certificate parameters, extensions, encoding and inspection
//! - [`issuer`]: Self-signed root issuance and persistence
//! - [`loader`]: Loading and matching persisted certificate/key pairs
//! - [`pem`]: PEM framing of persisted artifacts
//! - [`serial`]: Serial number generation
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate template and signing

pub mod cert;
pub mod error;
pub mod issuer;
pub mod key;
pub mod loader;
pub mod pem;
pub mod serial;
pub mod tbs_certificate;
