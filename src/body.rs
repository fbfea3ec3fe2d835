//! Body value model and content digest computation.
//!
//! The canonical string includes a fixed-length fingerprint of the request body so that
//! signatures are sensitive to body tampering. The digest must be byte-for-byte identical
//! across independent implementations, so the body is first rendered into a canonical
//! compact JSON encoding: object keys in lexicographic order, nested values encoded
//! recursively, no insignificant whitespace.

use {crate::crypto::md5_hex, bytes::Bytes, std::collections::BTreeMap};

/// A request body value: a closed tagged-variant type covering the shapes a body may take.
///
/// Object keys are stored stringified, so a key whose native type was not a string is
/// ordered by its string representation like any other. Because objects are kept in a
/// [`BTreeMap`], canonical (lexicographic) key order is structural: two objects with the
/// same entries compare and encode identically regardless of insertion order.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// An object, keyed by stringified names in lexicographic order.
    Object(BTreeMap<String, Body>),

    /// An array of values.
    Array(Vec<Body>),

    /// A string scalar.
    String(String),

    /// An integer scalar.
    Int(i64),

    /// A floating-point scalar.
    Float(f64),

    /// A boolean scalar.
    Bool(bool),

    /// An explicit null.
    Null,
}

impl Body {
    /// Build an object body from an iterator of key/value pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Body)>,
    {
        Body::Object(entries.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }

    /// Build an array body from an iterator of values.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Body>,
    {
        Body::Array(items.into_iter().collect())
    }

    /// Render the canonical compact JSON encoding of this value.
    pub fn canonical_json(&self) -> String {
        let mut result = String::new();
        self.encode_into(&mut result);
        result
    }

    fn encode_into(&self, out: &mut String) {
        match self {
            Body::Object(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    encode_json_string(key, out);
                    out.push(':');
                    value.encode_into(out);
                }
                out.push('}');
            }
            Body::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.encode_into(out);
                }
                out.push(']');
            }
            Body::String(value) => encode_json_string(value, out),
            Body::Int(value) => out.push_str(&value.to_string()),
            Body::Float(value) => out.push_str(&value.to_string()),
            Body::Bool(value) => out.push_str(if *value {
                "true"
            } else {
                "false"
            }),
            Body::Null => out.push_str("null"),
        }
    }
}

/// Encode a string as a JSON string literal, escaping per RFC 8259.
fn encode_json_string(value: &str, out: &mut String) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

impl From<&str> for Body {
    fn from(value: &str) -> Body {
        Body::String(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Body {
        Body::String(value)
    }
}

impl From<i64> for Body {
    fn from(value: i64) -> Body {
        Body::Int(value)
    }
}

impl From<i32> for Body {
    fn from(value: i32) -> Body {
        Body::Int(value as i64)
    }
}

impl From<f64> for Body {
    fn from(value: f64) -> Body {
        Body::Float(value)
    }
}

impl From<bool> for Body {
    fn from(value: bool) -> Body {
        Body::Bool(value)
    }
}

impl From<Vec<Body>> for Body {
    fn from(items: Vec<Body>) -> Body {
        Body::Array(items)
    }
}

impl From<BTreeMap<String, Body>> for Body {
    fn from(entries: BTreeMap<String, Body>) -> Body {
        Body::Object(entries)
    }
}

/// The body of a request as fed into the content digest.
///
/// The signing side usually holds a structured [`Body`]; the verification side usually
/// holds the raw payload bytes it read off the wire. Both digest identically when the
/// signer's canonical encoding matches the bytes that were sent.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// A structured body, digested over its canonical JSON encoding.
    Params(Body),

    /// A pre-encoded payload, digested over the bytes verbatim.
    Encoded(Bytes),
}

impl From<Body> for RequestBody {
    fn from(body: Body) -> RequestBody {
        RequestBody::Params(body)
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> RequestBody {
        RequestBody::Encoded(bytes)
    }
}

/// Compute the content digest for a request body.
///
/// An absent body, an empty object, and an empty pre-encoded payload all produce the
/// empty string: no digest is computed for no-body requests. Anything else produces a
/// 32-character lower-case hex MD5 digest.
pub fn content_digest(body: Option<&RequestBody>) -> String {
    match body {
        None => String::new(),
        Some(RequestBody::Params(Body::Object(entries))) if entries.is_empty() => String::new(),
        Some(RequestBody::Params(body)) => md5_hex(body.canonical_json().as_bytes()),
        Some(RequestBody::Encoded(bytes)) if bytes.is_empty() => String::new(),
        Some(RequestBody::Encoded(bytes)) => md5_hex(bytes),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{content_digest, Body, RequestBody},
        bytes::Bytes,
        std::collections::BTreeMap,
    };

    #[test_log::test]
    fn test_canonical_encoding() {
        let body = Body::object([
            ("b", Body::from(2)),
            ("a", Body::from("x")),
            ("c", Body::array([Body::from(1), Body::from(false), Body::Null])),
        ]);
        assert_eq!(body.canonical_json(), r#"{"a":"x","b":2,"c":[1,false,null]}"#);

        let nested = Body::object([("outer", Body::object([("inner", Body::from(1.5))]))]);
        assert_eq!(nested.canonical_json(), r#"{"outer":{"inner":1.5}}"#);
    }

    #[test_log::test]
    fn test_string_escaping() {
        let body = Body::object([("k", Body::from("a\"b\\c\nd\u{01}"))]);
        assert_eq!(body.canonical_json(), "{\"k\":\"a\\\"b\\\\c\\nd\\u0001\"}");
    }

    #[test_log::test]
    fn test_stringified_key_ordering() {
        // Keys that were numeric in their native representation order as strings: "10" < "2".
        let body = Body::object([("2", Body::from(2)), ("10", Body::from(10)), ("a", Body::from(0))]);
        assert_eq!(body.canonical_json(), r#"{"10":10,"2":2,"a":0}"#);
    }

    #[test_log::test]
    fn test_insertion_order_invariance() {
        let mut forward = BTreeMap::new();
        forward.insert("alpha".to_string(), Body::from(1));
        forward.insert("beta".to_string(), Body::from(2));

        let mut reverse = BTreeMap::new();
        reverse.insert("beta".to_string(), Body::from(2));
        reverse.insert("alpha".to_string(), Body::from(1));

        let forward = RequestBody::from(Body::Object(forward));
        let reverse = RequestBody::from(Body::Object(reverse));
        assert_eq!(content_digest(Some(&forward)), content_digest(Some(&reverse)));
    }

    #[test_log::test]
    fn test_digest_vector() {
        let body = RequestBody::from(Body::object([("abc", Body::from("def"))]));
        assert_eq!(content_digest(Some(&body)), "ecadfcaf838cc3166d637a196530bd90");
    }

    #[test_log::test]
    fn test_encoded_body_matches_params_body() {
        let params = RequestBody::from(Body::object([("abc", Body::from("def"))]));
        let encoded = RequestBody::from(Bytes::from_static(br#"{"abc":"def"}"#));
        assert_eq!(content_digest(Some(&params)), content_digest(Some(&encoded)));
    }

    #[test_log::test]
    fn test_empty_bodies_have_empty_digest() {
        assert_eq!(content_digest(None), "");
        assert_eq!(content_digest(Some(&RequestBody::from(Body::Object(BTreeMap::new())))), "");
        assert_eq!(content_digest(Some(&RequestBody::from(Bytes::new()))), "");
    }
}
