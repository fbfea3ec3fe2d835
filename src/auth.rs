//! Verification of inbound request credentials.
//!
//! The verifier mirrors the signing path: it snapshots the inbound request, recomputes
//! the canonical string, digest, and signature under the secret looked up by key id, and
//! compares the result to the received signature in constant time. An unknown key id and
//! a signature mismatch are expected, non-fatal outcomes; only lookup failures and
//! malformed requests surface as errors.
//!
//! No replay-window or timestamp-freshness check is performed here: the `date` value is
//! trusted verbatim. Freshness enforcement, if wanted, is a separately-configurable
//! policy in the enclosing request pipeline.

use {
    crate::{
        body::RequestBody,
        canonical::{CanonicalRequest, SignatureOptions},
        request::request_details_from_parts,
        signature::{canonical_signature, Credential},
        SignatureError,
    },
    derive_builder::Builder,
    http::{header::AUTHORIZATION, request::Parts},
    log::{debug, trace},
    std::{
        fmt::{Debug, Formatter, Result as FmtResult},
        future::Future,
    },
    subtle::ConstantTimeEq,
    tower::{service_fn, util::ServiceFn, BoxError, Service, ServiceExt},
};

/// Error message: `"Authorization header is not valid ASCII."`
const MSG_AUTH_HEADER_NOT_ASCII: &str = "Authorization header is not valid ASCII.";

/// Error message: `"Request is missing Authentication Token"`
const MSG_REQUEST_MISSING_AUTH_TOKEN: &str = "Request is missing Authentication Token";

/// Error message: `"Authorization credential names an unexpected service scheme:"`
const MSG_WRONG_SERVICE_SCHEME: &str = "Authorization credential names an unexpected service scheme:";

/// Uniform message for a failed verification. Shared between the unknown-key and
/// signature-mismatch outcomes so callers cannot probe which key ids are registered.
const MSG_VERIFICATION_FAILED: &str =
    "The request signature we calculated does not match the signature you provided.";

/// A request for the key secret associated with a key id.
///
/// GetKeySecretRequest structs are immutable. Use [`GetKeySecretRequestBuilder`] to
/// construct one programmatically.
#[derive(Builder, Clone, Debug)]
#[non_exhaustive]
pub struct GetKeySecretRequest {
    /// The key id presented in the request credential.
    #[builder(setter(into))]
    key_id: String,
}

impl GetKeySecretRequest {
    /// Create a [`GetKeySecretRequestBuilder`] to construct a [`GetKeySecretRequest`].
    #[inline]
    pub fn builder() -> GetKeySecretRequestBuilder {
        GetKeySecretRequestBuilder::default()
    }

    /// Retrieve the key id.
    #[inline]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// A response from the key secret provider.
///
/// A response with no key secret means the key id is not known to the store; that is an
/// expected outcome, not an error. GetKeySecretResponse structs are immutable. Use
/// [`GetKeySecretResponseBuilder`] to construct one programmatically.
#[derive(Builder, Clone, Default)]
pub struct GetKeySecretResponse {
    /// The key secret for the requested key id, if the key id is known.
    #[builder(setter(into, strip_option), default)]
    key_secret: Option<String>,
}

impl GetKeySecretResponse {
    /// Create a [`GetKeySecretResponseBuilder`] to construct a [`GetKeySecretResponse`].
    #[inline]
    pub fn builder() -> GetKeySecretResponseBuilder {
        GetKeySecretResponseBuilder::default()
    }

    /// Retrieve the key secret, if the key id is known.
    #[inline]
    pub fn key_secret(&self) -> Option<&str> {
        self.key_secret.as_deref()
    }
}

impl Debug for GetKeySecretResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        // The secret is never printed.
        f.debug_struct("GetKeySecretResponse").field("key_secret", &self.key_secret.as_ref().map(|_| "...")).finish()
    }
}

/// Create a Service that wraps a function that can look up a key secret.
pub fn service_for_key_secret_fn<F, Fut>(f: F) -> ServiceFn<F>
where
    F: FnOnce(GetKeySecretRequest) -> Fut + Send + 'static,
    Fut: Future<Output = Result<GetKeySecretResponse, BoxError>> + Send + 'static,
{
    service_fn(f)
}

/// The decision reached when verifying an inbound request credential.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VerificationOutcome {
    /// The recomputed signature matches the received one.
    Authenticated,

    /// The key id in the credential is not known to the key store.
    UnknownKeyId,

    /// The recomputed signature does not match the received one.
    SignatureMismatch,
}

impl VerificationOutcome {
    /// Report whether the request authenticated.
    #[inline]
    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }

    /// A message suitable for returning to the caller on failure, or `None` when the
    /// request authenticated. [`UnknownKeyId`][Self::UnknownKeyId] and
    /// [`SignatureMismatch`][Self::SignatureMismatch] share one message so responses do
    /// not leak which key ids exist.
    pub fn failure_message(self) -> Option<&'static str> {
        match self {
            Self::Authenticated => None,
            Self::UnknownKeyId | Self::SignatureMismatch => Some(MSG_VERIFICATION_FAILED),
        }
    }
}

/// Verify the credential of an inbound request.
///
/// Reads and parses the `Authorization` header, looks up the key secret for the
/// credential's key id through `get_key_secret`, recomputes the signature from the
/// request parts and `body` with the configured algorithm, and compares it to the
/// received signature in constant time.
///
/// The signer and this verifier must agree on `options` out-of-band; in particular a
/// request signed with a different hash algorithm verifies as a mismatch, not an error.
pub async fn verify_parts<S, F>(
    parts: &Parts,
    body: Option<RequestBody>,
    get_key_secret: &mut S,
    options: &SignatureOptions,
) -> Result<VerificationOutcome, SignatureError>
where
    S: Service<GetKeySecretRequest, Response = GetKeySecretResponse, Error = BoxError, Future = F> + Send,
    F: Future<Output = Result<GetKeySecretResponse, BoxError>> + Send,
{
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| SignatureError::MissingAuthenticationToken(MSG_REQUEST_MISSING_AUTH_TOKEN.to_string()))?;
    let header =
        header.to_str().map_err(|_| SignatureError::MalformedHeader(MSG_AUTH_HEADER_NOT_ASCII.to_string()))?;
    let credential: Credential = header.parse()?;

    if credential.service_name() != options.service_name() {
        return Err(SignatureError::IncompleteCredential(format!(
            "{} expected '{}', got '{}'.",
            MSG_WRONG_SERVICE_SCHEME,
            options.service_name(),
            credential.service_name()
        )));
    }

    let details = request_details_from_parts(parts, body);

    let req = GetKeySecretRequest::builder().key_id(credential.key_id()).build().expect("all fields set");
    let response = match get_key_secret.oneshot(req).await {
        Ok(response) => response,
        Err(e) => {
            debug!("get_key_secret: error looking up key secret: {}", e);
            return Err(match e.downcast::<SignatureError>() {
                Ok(sig_err) => *sig_err,
                Err(e) => SignatureError::InternalServiceError(e),
            });
        }
    };

    let key_secret = match response.key_secret() {
        Some(key_secret) => key_secret,
        None => {
            trace!("verify: no key secret for key id '{}'", credential.key_id());
            return Ok(VerificationOutcome::UnknownKeyId);
        }
    };

    let canonical = CanonicalRequest::from_details(&details, options);
    let expected = canonical_signature(&canonical, key_secret, options.algorithm());
    let is_equal: bool = expected.as_bytes().ct_eq(credential.signature().as_bytes()).into();
    if is_equal {
        Ok(VerificationOutcome::Authenticated)
    } else {
        trace!("verify: signature mismatch: expected '{}', got '{}'", expected, credential.signature());
        Ok(VerificationOutcome::SignatureMismatch)
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{
            service_for_key_secret_fn, sign_http_request, verify_parts, Body, GetKeySecretRequest,
            GetKeySecretResponse, SignatureError, SignatureOptions, VerificationOutcome,
        },
        http::Request,
        tower::BoxError,
    };

    const TEST_KEY_ID: &str = "SECRET_KEY_ID";
    const TEST_KEY_SECRET: &str = "abcdefghijkl";

    async fn get_key_secret(req: GetKeySecretRequest) -> Result<GetKeySecretResponse, BoxError> {
        let mut builder = GetKeySecretResponse::builder();
        if req.key_id() == TEST_KEY_ID {
            builder.key_secret(TEST_KEY_SECRET);
        }
        Ok(builder.build()?)
    }

    async fn failing_key_secret(_req: GetKeySecretRequest) -> Result<GetKeySecretResponse, BoxError> {
        Err("key store unavailable".into())
    }

    fn signed_request(key_id: &str) -> (http::request::Parts, Option<crate::RequestBody>) {
        let params = Body::object([("abc", Body::from("def"))]);
        let mut request = Request::post("https://example.com/api/auth")
            .header("content-type", "application/json")
            .header("date", "Fri, 22 Jul 2016")
            .body(())
            .unwrap();
        sign_http_request(
            &mut request,
            Some(params.clone().into()),
            key_id,
            TEST_KEY_SECRET,
            &SignatureOptions::default(),
        )
        .unwrap();
        (request.into_parts().0, Some(params.into()))
    }

    #[test_log::test(tokio::test)]
    async fn test_verify_round_trip() {
        let (parts, body) = signed_request(TEST_KEY_ID);
        let mut svc = service_for_key_secret_fn(get_key_secret);
        let outcome = verify_parts(&parts, body, &mut svc, &SignatureOptions::default()).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::Authenticated);
        assert!(outcome.is_authenticated());
        assert!(outcome.failure_message().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_verify_unknown_key_id() {
        let (parts, body) = signed_request("NOT_A_KEY");
        let mut svc = service_for_key_secret_fn(get_key_secret);
        let outcome = verify_parts(&parts, body, &mut svc, &SignatureOptions::default()).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::UnknownKeyId);
        assert!(!outcome.is_authenticated());
        // Unknown key and mismatch report the same message.
        assert_eq!(
            outcome.failure_message(),
            VerificationOutcome::SignatureMismatch.failure_message()
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_verify_tampered_body() {
        let (parts, _body) = signed_request(TEST_KEY_ID);
        let tampered = Some(Body::object([("abc", Body::from("xyz"))]).into());
        let mut svc = service_for_key_secret_fn(get_key_secret);
        let outcome = verify_parts(&parts, tampered, &mut svc, &SignatureOptions::default()).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::SignatureMismatch);
    }

    #[test_log::test(tokio::test)]
    async fn test_verify_algorithm_disagreement_is_mismatch() {
        let (parts, body) = signed_request(TEST_KEY_ID);
        let options = SignatureOptions::builder().algorithm(crate::HashAlgorithm::Sha256).build().unwrap();
        let mut svc = service_for_key_secret_fn(get_key_secret);
        let outcome = verify_parts(&parts, body, &mut svc, &options).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::SignatureMismatch);
    }

    #[test_log::test(tokio::test)]
    async fn test_verify_missing_authorization() {
        let (parts, _) = Request::post("https://example.com/api/auth").body(()).unwrap().into_parts();
        let mut svc = service_for_key_secret_fn(get_key_secret);
        match verify_parts(&parts, None, &mut svc, &SignatureOptions::default()).await {
            Err(SignatureError::MissingAuthenticationToken(msg)) => {
                assert_eq!(msg, "Request is missing Authentication Token")
            }
            other => panic!("expected MissingAuthenticationToken, got {:?}", other),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_verify_wrong_service_scheme() {
        let (parts, _) = Request::post("https://example.com/api/auth")
            .header("authorization", "OTHER.SCHEME SECRET_KEY_ID:c2lnbmF0dXJl")
            .body(())
            .unwrap()
            .into_parts();
        let mut svc = service_for_key_secret_fn(get_key_secret);
        match verify_parts(&parts, None, &mut svc, &SignatureOptions::default()).await {
            Err(SignatureError::IncompleteCredential(msg)) => {
                assert!(msg.contains("'NCSA.HMAC'"), "message was: {}", msg)
            }
            other => panic!("expected IncompleteCredential, got {:?}", other),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_verify_lookup_failure() {
        let (parts, body) = signed_request(TEST_KEY_ID);
        let mut svc = service_for_key_secret_fn(failing_key_secret);
        match verify_parts(&parts, body, &mut svc, &SignatureOptions::default()).await {
            Err(SignatureError::InternalServiceError(e)) => {
                assert_eq!(e.to_string(), "key store unavailable")
            }
            other => panic!("expected InternalServiceError, got {:?}", other),
        }
    }
}
