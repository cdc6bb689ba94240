use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use pkcs8::{DecodePrivateKey, EncodePublicKey};
use rand_core::{OsRng, RngCore};
use sha1::Sha1;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{Result, RootCaError};
use crate::pem;

/// Upper bound on scalar redraws before generation is abandoned.
///
/// For both curves the chance that a uniformly random field element is not a
/// valid scalar is below 2^-32, so hitting this limit means the entropy
/// source is broken.
const MAX_SCALAR_DRAWS: usize = 8;

/// Named curves a root key can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    /// NIST P-256 (secp256r1), signed with SHA-256.
    #[default]
    P256,
    /// NIST P-384 (secp384r1), signed with SHA-384.
    P384,
}

impl Curve {
    /// Object identifier of the named curve, as carried in SPKI parameters.
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            Curve::P256 => const_oid::db::rfc5912::SECP_256_R_1,
            Curve::P384 => const_oid::db::rfc5912::SECP_384_R_1,
        }
    }

    /// Signature algorithm paired with the curve.
    pub fn signature_algorithm(self) -> SignatureAlgorithm {
        match self {
            Curve::P256 => SignatureAlgorithm::Sha256WithECDSA,
            Curve::P384 => SignatureAlgorithm::Sha384WithECDSA,
        }
    }

    fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        [Curve::P256, Curve::P384]
            .into_iter()
            .find(|curve| curve.oid() == oid)
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::P256 => f.write_str("p256"),
            Curve::P384 => f.write_str("p384"),
        }
    }
}

impl FromStr for Curve {
    type Err = RootCaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "p256" | "p-256" | "secp256r1" | "prime256v1" => Ok(Curve::P256),
            "p384" | "p-384" | "secp384r1" => Ok(Curve::P384),
            other => Err(RootCaError::InvalidInput(format!(
                "unsupported curve: {other}"
            ))),
        }
    }
}

/// An elliptic-curve signing key pair.
///
/// The verifying half is always derived from the signing half, so a pair is
/// never partially constructed.
#[derive(Clone, Debug)]
pub enum KeyPair {
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
        verifying_key: P384VerifyingKey,
    },
}

impl KeyPair {
    /// Generate a key pair on `curve` from the OS random source.
    ///
    /// Fails with [`RootCaError::EntropyUnavailable`] if the random source
    /// cannot be read.
    pub fn generate(curve: Curve) -> Result<Self> {
        let key_pair = match curve {
            Curve::P256 => {
                let signing_key = draw_signing_key(32, P256SigningKey::from_slice)?;
                let verifying_key = *signing_key.verifying_key();
                KeyPair::EcdsaP256 {
                    signing_key,
                    verifying_key,
                }
            }
            Curve::P384 => {
                let signing_key = draw_signing_key(48, P384SigningKey::from_slice)?;
                let verifying_key = *signing_key.verifying_key();
                KeyPair::EcdsaP384 {
                    signing_key,
                    verifying_key,
                }
            }
        };
        tracing::debug!(%curve, "generated key pair");
        Ok(key_pair)
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Result<Self> {
        Self::generate(Curve::P256)
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Result<Self> {
        Self::generate(Curve::P384)
    }

    pub fn curve(&self) -> Curve {
        match self {
            KeyPair::EcdsaP256 { .. } => Curve::P256,
            KeyPair::EcdsaP384 { .. } => Curve::P384,
        }
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.curve().signature_algorithm()
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(*verifying_key),
            KeyPair::EcdsaP384 { verifying_key, .. } => PublicKey::EcdsaP384(*verifying_key),
        }
    }

    /// Signs `data` and returns the DER-encoded `ECDSA-Sig-Value`.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            KeyPair::EcdsaP256 { signing_key, .. } => {
                let signature: p256::ecdsa::DerSignature = signing_key
                    .try_sign(data)
                    .map_err(|e| RootCaError::SigningFailure(e.to_string()))?;
                Ok(signature.as_bytes().to_vec())
            }
            KeyPair::EcdsaP384 { signing_key, .. } => {
                let signature: p384::ecdsa::DerSignature = signing_key
                    .try_sign(data)
                    .map_err(|e| RootCaError::SigningFailure(e.to_string()))?;
                Ok(signature.as_bytes().to_vec())
            }
        }
    }

    /// Encodes the private key as a SEC1 `ECPrivateKey` structure.
    ///
    /// The named curve and the public key are always included, so OpenSSL
    /// and other SEC1 readers can load the key without outside context.
    pub fn to_sec1_der(&self) -> Result<Vec<u8>> {
        let (mut private_key, public_key) = match self {
            KeyPair::EcdsaP256 {
                signing_key,
                verifying_key,
            } => (
                signing_key.to_bytes().to_vec(),
                verifying_key.to_encoded_point(false).as_bytes().to_vec(),
            ),
            KeyPair::EcdsaP384 {
                signing_key,
                verifying_key,
            } => (
                signing_key.to_bytes().to_vec(),
                verifying_key.to_encoded_point(false).as_bytes().to_vec(),
            ),
        };

        let der = sec1::EcPrivateKey {
            private_key: private_key.as_slice(),
            parameters: Some(sec1::EcParameters::NamedCurve(self.curve().oid())),
            public_key: Some(public_key.as_slice()),
        }
        .to_der();
        private_key.fill(0);

        der.map_err(|e| RootCaError::SigningFailure(format!("cannot encode private key: {e}")))
    }

    /// Encodes the private key as an `EC PRIVATE KEY` PEM block.
    pub fn to_pem(&self) -> Result<String> {
        Ok(pem::encode(pem::EC_PRIVATE_KEY_LABEL, &self.to_sec1_der()?))
    }

    /// Decodes a SEC1 `ECPrivateKey` on any supported curve.
    ///
    /// The curve is taken from the `namedCurve` parameter. Keys written
    /// without it are matched by private key length.
    pub fn from_sec1_der(der: &[u8]) -> Result<Self> {
        let ec_private_key = sec1::EcPrivateKey::from_der(der)
            .map_err(|e| RootCaError::MalformedArtifact(format!("bad EC private key: {e}")))?;

        let curve = match ec_private_key.parameters {
            Some(sec1::EcParameters::NamedCurve(oid)) => Curve::from_oid(oid).ok_or_else(|| {
                RootCaError::MalformedArtifact(format!("unsupported curve: {oid}"))
            })?,
            None => match ec_private_key.private_key.len() {
                32 => Curve::P256,
                48 => Curve::P384,
                len => {
                    return Err(RootCaError::MalformedArtifact(format!(
                        "EC private key of {len} bytes matches no supported curve"
                    )));
                }
            },
        };

        let malformed = |e: p256::elliptic_curve::Error| {
            RootCaError::MalformedArtifact(format!("bad {curve} private key: {e}"))
        };
        match curve {
            Curve::P256 => {
                let secret_key =
                    p256::SecretKey::from_slice(ec_private_key.private_key).map_err(malformed)?;
                Ok(Self::from(P256SigningKey::from(secret_key)))
            }
            Curve::P384 => {
                let secret_key =
                    p384::SecretKey::from_slice(ec_private_key.private_key).map_err(malformed)?;
                Ok(Self::from(P384SigningKey::from(secret_key)))
            }
        }
    }

    /// Decodes a PKCS#8 `PrivateKeyInfo` holding a key on any supported curve.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        if let Ok(secret_key) = p256::SecretKey::from_pkcs8_der(der) {
            return Ok(Self::from(P256SigningKey::from(secret_key)));
        }
        if let Ok(secret_key) = p384::SecretKey::from_pkcs8_der(der) {
            return Ok(Self::from(P384SigningKey::from(secret_key)));
        }
        Err(RootCaError::MalformedArtifact(
            "PKCS#8 private key is not a P-256 or P-384 EC key".to_string(),
        ))
    }

    /// Decodes the first private key block of a PEM document.
    ///
    /// Both `EC PRIVATE KEY` (SEC1) and `PRIVATE KEY` (PKCS#8) blocks are accepted.
    pub fn from_pem(text: &str) -> Result<Self> {
        let (label, der) = pem::decode_private_key(text)?;
        match label.as_str() {
            pem::EC_PRIVATE_KEY_LABEL => Self::from_sec1_der(&der),
            pem::PRIVATE_KEY_LABEL => Self::from_pkcs8_der(&der),
            other => Err(RootCaError::MalformedArtifact(format!(
                "unsupported private key type: {other}"
            ))),
        }
    }
}

impl From<P256SigningKey> for KeyPair {
    fn from(signing_key: P256SigningKey) -> Self {
        let verifying_key = *signing_key.verifying_key();
        KeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }
}

impl From<P384SigningKey> for KeyPair {
    fn from(signing_key: P384SigningKey) -> Self {
        let verifying_key = *signing_key.verifying_key();
        KeyPair::EcdsaP384 {
            signing_key,
            verifying_key,
        }
    }
}

fn draw_signing_key<K>(
    field_len: usize,
    from_slice: impl Fn(&[u8]) -> std::result::Result<K, ecdsa::Error>,
) -> Result<K> {
    let mut bytes = vec![0u8; field_len];
    for _ in 0..MAX_SCALAR_DRAWS {
        OsRng.try_fill_bytes(&mut bytes)?;
        let candidate = from_slice(&bytes);
        bytes.fill(0);
        if let Ok(key) = candidate {
            return Ok(key);
        }
    }
    Err(RootCaError::EntropyUnavailable(format!(
        "no valid scalar after {MAX_SCALAR_DRAWS} draws"
    )))
}

/// The public half of a [`KeyPair`], as embedded in a certificate.
#[derive(Clone, Debug, PartialEq)]
pub enum PublicKey {
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
}

impl PublicKey {
    pub fn curve(&self) -> Curve {
        match self {
            PublicKey::EcdsaP256(_) => Curve::P256,
            PublicKey::EcdsaP384(_) => Curve::P384,
        }
    }

    /// Builds the `SubjectPublicKeyInfo` carried in the certificate.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let document = match self {
            PublicKey::EcdsaP256(verifying_key) => verifying_key.to_public_key_der(),
            PublicKey::EcdsaP384(verifying_key) => verifying_key.to_public_key_der(),
        }
        .map_err(|e| RootCaError::SigningFailure(format!("cannot encode public key: {e}")))?;
        SubjectPublicKeyInfoOwned::from_der(document.as_bytes())
            .map_err(|e| RootCaError::SigningFailure(format!("cannot encode public key: {e}")))
    }

    /// Reads an EC public key out of a `SubjectPublicKeyInfo`.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        if spki.algorithm.oid != const_oid::db::rfc5912::ID_EC_PUBLIC_KEY {
            return Err(RootCaError::MalformedArtifact(format!(
                "unsupported public key algorithm: {}",
                spki.algorithm.oid
            )));
        }
        let curve_oid = spki
            .algorithm
            .parameters
            .as_ref()
            .ok_or_else(|| {
                RootCaError::MalformedArtifact("EC public key has no curve parameter".to_string())
            })?
            .decode_as::<ObjectIdentifier>()
            .map_err(|e| RootCaError::MalformedArtifact(format!("bad curve parameter: {e}")))?;
        let point = spki.subject_public_key.raw_bytes();
        let malformed =
            |e: ecdsa::Error| RootCaError::MalformedArtifact(format!("bad EC point: {e}"));
        match Curve::from_oid(curve_oid) {
            Some(Curve::P256) => Ok(PublicKey::EcdsaP256(
                P256VerifyingKey::from_sec1_bytes(point).map_err(malformed)?,
            )),
            Some(Curve::P384) => Ok(PublicKey::EcdsaP384(
                P384VerifyingKey::from_sec1_bytes(point).map_err(malformed)?,
            )),
            None => Err(RootCaError::MalformedArtifact(format!(
                "unsupported curve: {curve_oid}"
            ))),
        }
    }

    /// Checks a DER-encoded ECDSA signature over `data`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self {
            PublicKey::EcdsaP256(verifying_key) => p256::ecdsa::DerSignature::try_from(signature)
                .is_ok_and(|sig| verifying_key.verify(data, &sig).is_ok()),
            PublicKey::EcdsaP384(verifying_key) => p384::ecdsa::DerSignature::try_from(signature)
                .is_ok_and(|sig| verifying_key.verify(data, &sig).is_ok()),
        }
    }

    /// SHA-1 over the subject public key bits (RFC 5280, 4.2.1.2, method 1).
    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        let spki = self.to_spki()?;
        let digest = <Sha1 as sha1::Digest>::digest(spki.subject_public_key.raw_bytes());
        Ok(digest.to_vec())
    }

    /// DER encoding of the `SubjectPublicKeyInfo`, used to compare keys.
    pub(crate) fn spki_der(&self) -> Result<Vec<u8>> {
        self.to_spki()?
            .to_der()
            .map_err(|e| RootCaError::SigningFailure(format!("cannot encode public key: {e}")))
    }
}
