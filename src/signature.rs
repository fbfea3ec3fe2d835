//! Signature computation and credential formatting.
//!
//! For fixed inputs (including an explicit date), [`sign`] is a pure function: no
//! randomness, no implicit state, no I/O. The wall clock is read only when the snapshot
//! carries no date. Two independent implementations given identical inputs must produce
//! byte-identical credentials; that interoperability requirement is why the hash
//! algorithm and the canonicalization rules are pinned down exactly rather than left to
//! library defaults.

use {
    crate::{
        canonical::{CanonicalRequest, RequestDetails, SignatureOptions},
        crypto::hmac_digest,
        SignatureError,
    },
    base64::{engine::general_purpose::STANDARD as BASE64, Engine},
    lazy_static::lazy_static,
    regex::Regex,
    std::{
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// Default service name used in the credential string.
pub const DEFAULT_SERVICE_NAME: &str = "NCSA.HMAC";

/// Error message: `"Credential must have the form '<service_name> <key_id>:<signature>',"`
const MSG_CREDENTIAL_FORMAT: &str = "Credential must have the form '<service_name> <key_id>:<signature>',";

/// Error message: `"Signing requires a non-empty 'key_id'."`
const MSG_KEY_ID_REQUIRED: &str = "Signing requires a non-empty 'key_id'.";

/// Error message: `"Signing requires a non-empty 'key_secret'."`
const MSG_KEY_SECRET_REQUIRED: &str = "Signing requires a non-empty 'key_secret'.";

/// Error message: `"Unsupported signature 'algorithm': "`
const MSG_UNSUPPORTED_ALGORITHM: &str = "Unsupported signature 'algorithm': ";

lazy_static! {
    /// Pattern for a serialized credential: `<service_name> <key_id>:<signature>`.
    static ref CREDENTIAL_RE: Regex = Regex::new(r"^\s*(\S+)\s+([^:\s]+):([A-Za-z0-9+/=]+)\s*$").unwrap();
}

/// The keyed-hash algorithms supported for signature computation.
///
/// The algorithm is not embedded in the credential string; signer and verifier must agree
/// on it by configuration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum HashAlgorithm {
    /// HMAC over SHA-256 (256-bit digest).
    Sha256,

    /// HMAC over SHA-384 (384-bit digest).
    Sha384,

    /// HMAC over SHA-512 (512-bit digest). This is the default.
    #[default]
    Sha512,
}

impl HashAlgorithm {
    /// The configuration name of the algorithm.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, SignatureError> {
        match s.trim().to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha384" | "sha-384" => Ok(Self::Sha384),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            _ => Err(SignatureError::UnsupportedAlgorithm(format!("{}'{}'.", MSG_UNSUPPORTED_ALGORITHM, s))),
        }
    }
}

/// The serialized authorization value: a service name, a key id, and a base64 signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credential {
    service_name: String,
    key_id: String,
    signature: String,
}

impl Credential {
    /// Assemble a credential from its parts.
    pub fn new(service_name: impl Into<String>, key_id: impl Into<String>, signature: impl Into<String>) -> Self {
        Credential {
            service_name: service_name.into(),
            key_id: key_id.into(),
            signature: signature.into(),
        }
    }

    /// Retrieve the service name.
    #[inline]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Retrieve the key id.
    #[inline]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Retrieve the base64 signature.
    #[inline]
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl Display for Credential {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{} {}:{}", self.service_name, self.key_id, self.signature)
    }
}

impl FromStr for Credential {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, SignatureError> {
        match CREDENTIAL_RE.captures(s) {
            Some(captures) => Ok(Credential {
                service_name: captures[1].to_string(),
                key_id: captures[2].to_string(),
                signature: captures[3].to_string(),
            }),
            None => Err(SignatureError::IncompleteCredential(format!("{} got '{}'", MSG_CREDENTIAL_FORMAT, s))),
        }
    }
}

/// Compute the base64 signature over an already-canonicalized request.
pub fn canonical_signature(canonical: &CanonicalRequest, key_secret: &str, algorithm: HashAlgorithm) -> String {
    let message = canonical.canonical_string();
    BASE64.encode(hmac_digest(algorithm, key_secret.as_bytes(), message.as_bytes()))
}

/// Compute the base64 signature for a request snapshot: canonicalize, then take the
/// keyed-hash digest of the canonical string under `key_secret`.
pub fn signature(details: &RequestDetails, key_secret: &str, options: &SignatureOptions) -> String {
    canonical_signature(&CanonicalRequest::from_details(details, options), key_secret, options.algorithm())
}

pub(crate) fn validate_keys(key_id: &str, key_secret: &str) -> Result<(), SignatureError> {
    if key_id.is_empty() {
        return Err(SignatureError::MissingKeyId(MSG_KEY_ID_REQUIRED.to_string()));
    }
    if key_secret.is_empty() {
        return Err(SignatureError::MissingKeySecret(MSG_KEY_SECRET_REQUIRED.to_string()));
    }
    Ok(())
}

/// Sign an already-canonicalized request, producing the authorization credential.
///
/// Fails with [`SignatureError::MissingKeyId`] or [`SignatureError::MissingKeySecret`]
/// when the corresponding value is empty; no credential is ever produced for a partial
/// signing identity.
pub fn sign_canonical(
    canonical: &CanonicalRequest,
    key_id: &str,
    key_secret: &str,
    service_name: &str,
    algorithm: HashAlgorithm,
) -> Result<Credential, SignatureError> {
    validate_keys(key_id, key_secret)?;
    Ok(Credential::new(service_name, key_id, canonical_signature(canonical, key_secret, algorithm)))
}

/// Sign a request snapshot, producing the authorization credential
/// `"<service_name> <key_id>:<signature>"`.
pub fn sign(
    details: &RequestDetails,
    key_id: &str,
    key_secret: &str,
    options: &SignatureOptions,
) -> Result<Credential, SignatureError> {
    let canonical = CanonicalRequest::from_details(details, options);
    sign_canonical(&canonical, key_id, key_secret, options.service_name(), options.algorithm())
}
