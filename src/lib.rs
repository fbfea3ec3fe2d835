//! The `ncsa_hmac_signature` crate implements the NCSA.HMAC stateless, symmetric-key
//! request-signing scheme for HTTP-style requests, structurally similar to AWS SigV4 and
//! OAuth 1.0a signing.
//!
//! A client holding a `(key_id, key_secret)` pair derives a deterministic canonical
//! string from the security-relevant fields of an outgoing request (method, content
//! type, a content digest of the body, date, path), computes a keyed-hash signature over
//! it, and attaches `"<service_name> <key_id>:<signature>"` as the `Authorization`
//! credential. A receiver holding the same secret recomputes the signature from the
//! inbound request and accepts it only when the signatures match.
//!
//! The core is purely functional and holds no shared mutable state; it is safe to invoke
//! concurrently without locks. The only non-deterministic input is the wall-clock read
//! used to default a missing date. The hash algorithm and service name are not embedded
//! in the credential: signer and verifier agree on a [`SignatureOptions`] out-of-band.
//!
//! # Workflow
//! The typical signing workflow is:
//! 1. Build the request and its body ([`Body`] for structured params, or raw bytes).
//! 2. Call [`sign_http_request`] to canonicalize, sign, and write the `Authorization`,
//!    `Content-Digest`, and `Date` headers back onto the request.
//!
//! The receiving side collects the request parts and body, supplies a key-secret lookup
//! service, and calls [`verify_parts`], which reports one of the
//! [`VerificationOutcome`] decisions.
//!
//! ## Example
//! ```rust
//! use http::Request;
//! use ncsa_hmac_signature::{
//!     service_for_key_secret_fn, sign_http_request, verify_parts, Body, GetKeySecretRequest,
//!     GetKeySecretResponse, SignatureOptions, VerificationOutcome,
//! };
//! use tower::BoxError;
//!
//! const KEY_ID: &str = "SECRET_KEY_ID";
//! const KEY_SECRET: &str = "abcdefghijkl";
//!
//! // This is a mock lookup that recognizes a single static key. For actual use, you
//! // would call out to a database or other store to resolve the key id.
//! async fn get_key_secret(req: GetKeySecretRequest) -> Result<GetKeySecretResponse, BoxError> {
//!     let mut builder = GetKeySecretResponse::builder();
//!     if req.key_id() == KEY_ID {
//!         builder.key_secret(KEY_SECRET);
//!     }
//!     Ok(builder.build()?)
//! }
//!
//! # tokio_test::block_on(async {
//! let params = Body::object([("abc", Body::from("def"))]);
//! let options = SignatureOptions::default();
//!
//! // Client side: sign the outgoing request.
//! let mut request = Request::post("https://example.com/api/auth")
//!     .header("Content-Type", "application/json")
//!     .header("Date", "Fri, 22 Jul 2016")
//!     .body(())
//!     .unwrap();
//! sign_http_request(&mut request, Some(params.clone().into()), KEY_ID, KEY_SECRET, &options)
//!     .unwrap();
//!
//! // Server side: look up the secret by key id and verify.
//! let (parts, _body) = request.into_parts();
//! let mut get_key_secret_svc = service_for_key_secret_fn(get_key_secret);
//! let outcome = verify_parts(&parts, Some(params.into()), &mut get_key_secret_svc, &options)
//!     .await
//!     .unwrap();
//! assert_eq!(outcome, VerificationOutcome::Authenticated);
//! # });
//! ```
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

mod auth;
mod body;
mod canonical;
mod crypto;
mod error;
mod request;
mod signature;

pub use crate::{
    auth::{
        service_for_key_secret_fn, verify_parts, GetKeySecretRequest, GetKeySecretRequestBuilder,
        GetKeySecretResponse, GetKeySecretResponseBuilder, VerificationOutcome,
    },
    body::{content_digest, Body, RequestBody},
    canonical::{
        CanonicalRequest, RequestDetails, RequestDetailsBuilder, SignatureOptions, SignatureOptionsBuilder,
    },
    error::SignatureError,
    request::{request_details_from_parts, sign_http_request},
    signature::{
        canonical_signature, sign, sign_canonical, signature, Credential, HashAlgorithm, DEFAULT_SERVICE_NAME,
    },
};
