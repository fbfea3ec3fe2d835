use {
    http::status::StatusCode,
    scratchstack_errors::ServiceError,
    std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    },
};

/// Error code: IncompleteCredential
const ERR_CODE_INCOMPLETE_CREDENTIAL: &str = "IncompleteCredential";

/// Error code: InternalFailure
const ERR_CODE_INTERNAL_FAILURE: &str = "InternalFailure";

/// Error code: MalformedHeader
const ERR_CODE_MALFORMED_HEADER: &str = "MalformedHeader";

/// Error code: MissingAuthenticationToken
const ERR_CODE_MISSING_AUTHENTICATION_TOKEN: &str = "MissingAuthenticationToken";

/// Error code: MissingKeyId
const ERR_CODE_MISSING_KEY_ID: &str = "MissingKeyId";

/// Error code: MissingKeySecret
const ERR_CODE_MISSING_KEY_SECRET: &str = "MissingKeySecret";

/// Error code: UnsupportedAlgorithm
const ERR_CODE_UNSUPPORTED_ALGORITHM: &str = "UnsupportedAlgorithm";

/// Error returned when signing a request or verifying its credential fails outright.
///
/// An unknown key id or a non-matching signature is not an error: those are expected
/// outcomes, reported as [`VerificationOutcome`][crate::VerificationOutcome] values.
/// Signing errors abort request construction entirely; no partially-signed request is
/// ever produced.
#[derive(Debug)]
#[non_exhaustive]
pub enum SignatureError {
    /// The `Authorization` value does not have the `<service_name> <key_id>:<signature>`
    /// form, or names a service scheme other than the one the verifier is configured for.
    IncompleteCredential(/* message */ String),

    /// Verification failed due to an internal error while looking up the key secret.
    InternalServiceError(Box<dyn Error + Send + Sync>),

    /// A header was malformed -- the inbound value could not be decoded as ASCII, or a
    /// computed value could not be encoded as a header.
    MalformedHeader(/* message */ String),

    /// The request carries no `Authorization` header. Sample message:
    /// `Request is missing Authentication Token`
    MissingAuthenticationToken(/* message */ String),

    /// No key id was supplied at sign time. Fatal: the caller's configuration must be
    /// fixed, the error is never substituted with a default.
    MissingKeyId(/* message */ String),

    /// No key secret was supplied at sign time. Fatal, as with a missing key id.
    MissingKeySecret(/* message */ String),

    /// The requested keyed-hash algorithm is not in the supported set. There is no silent
    /// fallback to a default algorithm.
    UnsupportedAlgorithm(/* message */ String),
}

impl SignatureError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::IncompleteCredential(_) => ERR_CODE_INCOMPLETE_CREDENTIAL,
            Self::InternalServiceError(_) => ERR_CODE_INTERNAL_FAILURE,
            Self::MalformedHeader(_) => ERR_CODE_MALFORMED_HEADER,
            Self::MissingAuthenticationToken(_) => ERR_CODE_MISSING_AUTHENTICATION_TOKEN,
            Self::MissingKeyId(_) => ERR_CODE_MISSING_KEY_ID,
            Self::MissingKeySecret(_) => ERR_CODE_MISSING_KEY_SECRET,
            Self::UnsupportedAlgorithm(_) => ERR_CODE_UNSUPPORTED_ALGORITHM,
        }
    }

    fn http_status(&self) -> StatusCode {
        match self {
            Self::IncompleteCredential(_) | Self::MalformedHeader(_) | Self::MissingAuthenticationToken(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InternalServiceError(_)
            | Self::MissingKeyId(_)
            | Self::MissingKeySecret(_)
            | Self::UnsupportedAlgorithm(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ServiceError for SignatureError {
    fn error_code(&self) -> &'static str {
        SignatureError::error_code(self)
    }

    fn http_status(&self) -> StatusCode {
        SignatureError::http_status(self)
    }
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::IncompleteCredential(msg) => f.write_str(msg),
            Self::InternalServiceError(ref e) => Display::fmt(e, f),
            Self::MalformedHeader(msg) => f.write_str(msg),
            Self::MissingAuthenticationToken(msg) => f.write_str(msg),
            Self::MissingKeyId(msg) => f.write_str(msg),
            Self::MissingKeySecret(msg) => f.write_str(msg),
            Self::UnsupportedAlgorithm(msg) => f.write_str(msg),
        }
    }
}

impl Error for SignatureError {}

impl From<Box<dyn Error + Send + Sync>> for SignatureError {
    fn from(e: Box<dyn Error + Send + Sync>) -> SignatureError {
        match e.downcast::<SignatureError>() {
            Ok(sig_err) => *sig_err,
            Err(e) => SignatureError::InternalServiceError(e),
        }
    }
}
