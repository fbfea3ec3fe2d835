//! Canonicalization of a request snapshot into the string that gets signed.
//!
//! Canonicalization is a pure function of a [`RequestDetails`] snapshot: once the snapshot
//! is taken, no field is re-read from the original request. Each step produces a new value,
//! in a fixed order, so two independent implementations given the same snapshot produce
//! byte-identical canonical strings.

use {
    crate::{
        body::{content_digest, RequestBody},
        signature::{HashAlgorithm, DEFAULT_SERVICE_NAME},
    },
    chrono::Utc,
    derive_builder::Builder,
    log::trace,
};

/// Extended ISO-8601 format, with explicit UTC designator, used when a request supplies
/// no date of its own.
pub(crate) const ISO8601_EXTENDED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The HTTP method treated as body-less unless configured otherwise.
const DEFAULT_BODYLESS_METHOD: &str = "GET";

/// A snapshot of the five canonical inputs of a request.
///
/// RequestDetails structs are immutable. Use [`RequestDetailsBuilder`] to construct a
/// snapshot programmatically, or
/// [`request_details_from_parts`][crate::request_details_from_parts] to take one from an
/// `http` request.
#[derive(Builder, Clone, Debug)]
#[non_exhaustive]
pub struct RequestDetails {
    /// The HTTP method. Matched case-insensitively; canonicalized to upper case.
    #[builder(setter(into))]
    method: String,

    /// The content type. An empty value is a valid, distinct canonical value; it is never
    /// substituted with a default.
    #[builder(setter(into), default)]
    content_type: String,

    /// The request path. Canonicalized to lower case.
    #[builder(setter(into))]
    path: String,

    /// The request date, passed through verbatim. An empty value is resolved to the
    /// current UTC timestamp at canonicalization time.
    #[builder(setter(into), default)]
    date: String,

    /// The request body, if any.
    #[builder(setter(into), default)]
    params: Option<RequestBody>,
}

impl RequestDetails {
    /// Create a [`RequestDetailsBuilder`] to construct a [`RequestDetails`].
    #[inline]
    pub fn builder() -> RequestDetailsBuilder {
        RequestDetailsBuilder::default()
    }

    /// Retrieve the HTTP method.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Retrieve the content type.
    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Retrieve the request path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Retrieve the request date.
    #[inline]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Retrieve the request body, if any.
    #[inline]
    pub fn params(&self) -> Option<&RequestBody> {
        self.params.as_ref()
    }
}

/// Configuration for signing and verification.
///
/// Signer and verifier must agree on all of these out-of-band: none of them are embedded
/// in the credential string. SignatureOptions structs are immutable. Use
/// [`SignatureOptionsBuilder`] to construct one programmatically.
#[derive(Builder, Clone, Debug)]
pub struct SignatureOptions {
    /// The service name placed in front of the credential.
    #[builder(setter(into), default = "DEFAULT_SERVICE_NAME.to_string()")]
    service_name: String,

    /// The keyed-hash algorithm.
    #[builder(default)]
    algorithm: HashAlgorithm,

    /// Methods whose body is dropped from the canonical inputs before digesting, matched
    /// case-insensitively.
    #[builder(setter(into), default = "vec![DEFAULT_BODYLESS_METHOD.to_string()]")]
    bodyless_methods: Vec<String>,
}

impl SignatureOptions {
    /// Create a [`SignatureOptionsBuilder`] to construct a [`SignatureOptions`].
    #[inline]
    pub fn builder() -> SignatureOptionsBuilder {
        SignatureOptionsBuilder::default()
    }

    /// Retrieve the service name.
    #[inline]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Retrieve the keyed-hash algorithm.
    #[inline]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Retrieve the body-less method classification.
    #[inline]
    pub fn bodyless_methods(&self) -> &[String] {
        &self.bodyless_methods
    }

    /// Report whether `method` is classified as body-less.
    pub fn is_bodyless(&self, method: &str) -> bool {
        self.bodyless_methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

impl Default for SignatureOptions {
    fn default() -> Self {
        SignatureOptionsBuilder::default().build().expect("all fields have defaults")
    }
}

/// The canonical form of a request: the resolved values that make up the canonical string.
///
/// Building a CanonicalRequest applies the fixed transform order: date resolution,
/// body-less stripping, digest computation. The resolved date and digest are retained so
/// the caller can persist them back onto the outgoing request; the verifier must observe
/// the same values the signer used.
#[derive(Clone, Debug)]
pub struct CanonicalRequest {
    method: String,
    content_type: String,
    content_digest: String,
    date: String,
    path: String,
    date_defaulted: bool,
}

impl CanonicalRequest {
    /// Canonicalize a request snapshot.
    pub fn from_details(details: &RequestDetails, options: &SignatureOptions) -> Self {
        let params = if options.is_bodyless(details.method()) {
            None
        } else {
            details.params()
        };
        let content_digest = content_digest(params);

        let (date, date_defaulted) = if details.date().is_empty() {
            (Utc::now().format(ISO8601_EXTENDED_FORMAT).to_string(), true)
        } else {
            (details.date().to_string(), false)
        };

        CanonicalRequest {
            method: details.method().to_uppercase(),
            content_type: details.content_type().to_string(),
            content_digest,
            date,
            path: details.path().to_lowercase(),
            date_defaulted,
        }
    }

    /// Assemble the canonical string: upper-cased method, content type, content digest,
    /// date, and lower-cased path, joined by single newlines.
    pub fn canonical_string(&self) -> String {
        let result = [
            self.method.as_str(),
            self.content_type.as_str(),
            self.content_digest.as_str(),
            self.date.as_str(),
            self.path.as_str(),
        ]
        .join("\n");
        trace!("canonical string:\n{}", result);
        result
    }

    /// Retrieve the upper-cased method.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Retrieve the content type.
    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Retrieve the content digest; empty for no-body requests.
    #[inline]
    pub fn content_digest(&self) -> &str {
        &self.content_digest
    }

    /// Retrieve the resolved date.
    #[inline]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Retrieve the lower-cased path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Report whether the date was defaulted during canonicalization. When true, the
    /// caller must persist [`date`][Self::date] onto the outgoing request so the verifier
    /// observes the same value.
    #[inline]
    pub fn date_defaulted(&self) -> bool {
        self.date_defaulted
    }
}
