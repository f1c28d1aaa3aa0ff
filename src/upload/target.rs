use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Url;
use serde::Deserialize;

use super::error::{Result, UploadError};

/// Characters left as is by JavaScript's `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Deserialize)]
struct SignedTargetPayload {
    #[serde(rename = "signedUrl")]
    signed_url: Option<serde_json::Value>,
}

/// A one-shot writable location issued by the backend
#[derive(Debug, PartialEq, Eq)]
pub struct SignedTarget {
    url: Url,
}

impl SignedTarget {
    /// Validate a signed URL response body
    pub fn from_response(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(UploadError::malformed("empty response body"));
        }

        let payload: SignedTargetPayload = serde_json::from_slice(body)
            .map_err(|e| UploadError::malformed(format!("invalid JSON: {}", e)))?;

        let raw = match payload.signed_url {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => {
                return Err(UploadError::malformed("missing 'signedUrl' field"));
            }
            Some(_) => return Err(UploadError::malformed("'signedUrl' is not a string")),
        };

        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UploadError::malformed("'signedUrl' is empty"));
        }

        let url = Url::parse(raw)
            .map_err(|e| UploadError::malformed(format!("'signedUrl' is not a URL: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(UploadError::malformed(format!(
                "'signedUrl' has unsupported scheme '{}'",
                url.scheme()
            )));
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The object location without the signature, safe to print or log
    pub fn location(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.to_string()
    }
}

/// Build the signed URL request for `file_name` against `endpoint`
///
/// The name is percent-encoded once and appended as the `name` query
/// parameter, keeping any query the endpoint already has.
pub fn signed_target_request_url(endpoint: &Url, file_name: &str) -> Url {
    let name = utf8_percent_encode(file_name, COMPONENT).to_string();
    let mut url = endpoint.clone();

    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{}&name={}", existing, name),
        _ => format!("name={}", name),
    };
    url.set_query(Some(&query));
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_encoding() {
        let endpoint = Url::parse("https://api.example.com/dev/import").unwrap();

        assert_eq!(
            signed_target_request_url(&endpoint, "orders.csv").as_str(),
            "https://api.example.com/dev/import?name=orders.csv"
        );
        assert_eq!(
            signed_target_request_url(&endpoint, "my orders (v2).csv").as_str(),
            "https://api.example.com/dev/import?name=my%20orders%20(v2).csv"
        );
        assert_eq!(
            signed_target_request_url(&endpoint, "a&b=c/ü.csv").as_str(),
            "https://api.example.com/dev/import?name=a%26b%3Dc%2F%C3%BC.csv"
        );
    }

    #[test]
    fn test_request_url_keeps_existing_query() {
        let endpoint = Url::parse("https://api.example.com/import?stage=dev").unwrap();
        assert_eq!(
            signed_target_request_url(&endpoint, "orders.csv").as_str(),
            "https://api.example.com/import?stage=dev&name=orders.csv"
        );
    }

    #[test]
    fn test_parse_valid_response() {
        let target =
            SignedTarget::from_response(br#"{ "signedUrl": "https://store.example/x123" }"#)
                .unwrap();
        assert_eq!(target.url().as_str(), "https://store.example/x123");

        // Extra fields are ignored
        let target = SignedTarget::from_response(
            br#"{"signedUrl":"https://store.example/uploaded/orders.csv?X-Amz-Signature=abc","expires":300}"#,
        )
        .unwrap();
        assert_eq!(
            target.location(),
            "https://store.example/uploaded/orders.csv"
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let cases: &[&[u8]] = &[
            b"",
            b"   ",
            b"not json",
            b"{}",
            b"[]",
            br#"{"signedUrl": null}"#,
            br#"{"signedUrl": ""}"#,
            br#"{"signedUrl": "   "}"#,
            br#"{"signedUrl": 42}"#,
            br#"{"signedUrl": "/relative/path"}"#,
            br#"{"signedUrl": "ftp://store.example/x"}"#,
            br#"{"url": "https://store.example/x"}"#,
        ];

        for body in cases {
            let err = SignedTarget::from_response(body).unwrap_err();
            assert!(
                matches!(err, UploadError::MalformedBackendResponse { .. }),
                "expected malformed for {:?}, got {:?}",
                String::from_utf8_lossy(body),
                err
            );
        }
    }
}
