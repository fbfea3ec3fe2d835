//! Binding between `http` request objects and the canonical inputs.
//!
//! This is the adapter boundary: it snapshots the five canonical inputs from a concrete
//! request and, after signing, writes the resulting header values back. The core never
//! re-reads the request once the snapshot is taken.

use {
    crate::{
        body::RequestBody,
        canonical::{CanonicalRequest, RequestDetails, SignatureOptions},
        signature::{sign_canonical, Credential},
        SignatureError,
    },
    http::{
        header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, DATE},
        request::{Parts, Request},
    },
};

/// Header carrying the content digest of the request body.
const CONTENT_DIGEST: HeaderName = HeaderName::from_static("content-digest");

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> &'a str {
    headers.get(name).and_then(|value| value.to_str().ok()).unwrap_or("")
}

fn details_from(method: &str, path: &str, headers: &HeaderMap, body: Option<RequestBody>) -> RequestDetails {
    RequestDetails::builder()
        .method(method)
        .content_type(header_str(headers, &CONTENT_TYPE))
        .path(path)
        .date(header_str(headers, &DATE))
        .params(body)
        .build()
        .expect("all required fields set")
}

fn header_value(value: &str) -> Result<HeaderValue, SignatureError> {
    HeaderValue::from_str(value)
        .map_err(|e| SignatureError::MalformedHeader(format!("'{}' is not a valid header value: {}", value, e)))
}

/// Snapshot the canonical inputs of an inbound request: method, `Content-Type` header
/// (empty if absent), URI path, `Date` header (empty if absent), and the collected body.
pub fn request_details_from_parts(parts: &Parts, body: Option<RequestBody>) -> RequestDetails {
    details_from(parts.method.as_str(), parts.uri.path(), &parts.headers, body)
}

/// Sign an outgoing request and write the resulting headers back onto it.
///
/// On success the request carries an `Authorization` header with the credential, a
/// `Content-Digest` header with the resolved digest (only when a digest was computed),
/// and a `Date` header with the resolved date (only when the request had none, so the
/// verifier observes the same value the signature covers). On failure the request is not
/// modified: an unsigned or partially-signed request is never produced.
pub fn sign_http_request<B>(
    request: &mut Request<B>,
    params: Option<RequestBody>,
    key_id: &str,
    key_secret: &str,
    options: &SignatureOptions,
) -> Result<Credential, SignatureError> {
    let details = details_from(request.method().as_str(), request.uri().path(), request.headers(), params);
    let canonical = CanonicalRequest::from_details(&details, options);
    let credential = sign_canonical(&canonical, key_id, key_secret, options.service_name(), options.algorithm())?;

    let authorization = header_value(&credential.to_string())?;
    let content_digest = if canonical.content_digest().is_empty() {
        None
    } else {
        Some(header_value(canonical.content_digest())?)
    };
    let date = if request.headers().contains_key(DATE) {
        None
    } else {
        Some(header_value(canonical.date())?)
    };

    let headers = request.headers_mut();
    headers.insert(AUTHORIZATION, authorization);
    if let Some(content_digest) = content_digest {
        headers.insert(CONTENT_DIGEST, content_digest);
    }
    if let Some(date) = date {
        headers.insert(DATE, date);
    }

    Ok(credential)
}

#[cfg(test)]
mod tests {
    use {
        super::{request_details_from_parts, sign_http_request, CONTENT_DIGEST},
        crate::{Body, SignatureError, SignatureOptions},
        http::{header::AUTHORIZATION, Request},
    };

    const TEST_KEY_ID: &str = "SECRET_KEY_ID";
    const TEST_KEY_SECRET: &str = "abcdefghijkl";

    #[test_log::test]
    fn test_sign_writes_headers() {
        let mut request = Request::post("https://example.com/api/auth")
            .header("content-type", "application/json")
            .header("date", "Fri, 22 Jul 2016")
            .body(())
            .unwrap();
        let params = Body::object([("abc", Body::from("def"))]);
        let credential = sign_http_request(
            &mut request,
            Some(params.into()),
            TEST_KEY_ID,
            TEST_KEY_SECRET,
            &SignatureOptions::default(),
        )
        .unwrap();

        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "NCSA.HMAC SECRET_KEY_ID:svO1jOUW+3wSVc/rzs4WQSOsWtABji6ppN0AkS++2SNvt6fPPvxonLV5WRgFaqnVc63RNmAndel8e/hxoNB4Pg=="
        );
        assert_eq!(request.headers().get(CONTENT_DIGEST).unwrap(), "ecadfcaf838cc3166d637a196530bd90");
        // The caller-supplied date is left untouched.
        assert_eq!(request.headers().get("date").unwrap(), "Fri, 22 Jul 2016");
        assert_eq!(credential.key_id(), TEST_KEY_ID);
    }

    #[test_log::test]
    fn test_sign_defaults_date_header() {
        let mut request = Request::post("https://example.com/api/auth").body(()).unwrap();
        sign_http_request(&mut request, None, TEST_KEY_ID, TEST_KEY_SECRET, &SignatureOptions::default()).unwrap();
        // The resolved date is persisted so the verifier sees the signed value.
        let date = request.headers().get("date").unwrap().to_str().unwrap();
        assert!(date.ends_with('Z'), "resolved date was: {}", date);
    }

    #[test_log::test]
    fn test_sign_get_omits_content_digest() {
        let mut request = Request::get("https://example.com/api/resource")
            .header("date", "Fri, 22 Jul 2016")
            .body(())
            .unwrap();
        let params = Body::object([("abc", Body::from("def"))]);
        sign_http_request(
            &mut request,
            Some(params.into()),
            TEST_KEY_ID,
            TEST_KEY_SECRET,
            &SignatureOptions::default(),
        )
        .unwrap();
        assert!(request.headers().get(CONTENT_DIGEST).is_none());
    }

    #[test_log::test]
    fn test_sign_failure_leaves_request_unmodified() {
        let mut request = Request::post("https://example.com/api/auth").body(()).unwrap();
        match sign_http_request(&mut request, None, "", TEST_KEY_SECRET, &SignatureOptions::default()) {
            Err(SignatureError::MissingKeyId(_)) => (),
            other => panic!("expected MissingKeyId, got {:?}", other),
        }
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert!(request.headers().get("date").is_none());
    }

    #[test_log::test]
    fn test_details_snapshot() {
        let (parts, _) = Request::get("https://example.com/API/Path?ignored=1")
            .header("content-type", "text/plain")
            .header("date", "Fri, 22 Jul 2016")
            .body(())
            .unwrap()
            .into_parts();
        let details = request_details_from_parts(&parts, None);
        assert_eq!(details.method(), "GET");
        assert_eq!(details.content_type(), "text/plain");
        assert_eq!(details.path(), "/API/Path");
        assert_eq!(details.date(), "Fri, 22 Jul 2016");
        assert!(details.params().is_none());
    }
}
