use std::{collections::BTreeMap, sync::Arc};

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::{
    decode::decode_body,
    status::{status_text, TRANSPORT_FAILURE_STATUS},
    DecodeError, FetchError, RawResponse,
};

/// Binary payload read from an `image/*` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub content_type: String,
    pub data: Bytes,
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", &self.content_type)?;
        map.serialize_entry("size", &self.data.len())?;
        map.end()
    }
}

/// Decoded response payload. Its shape depends on the content type.
#[derive(Clone, Debug)]
pub enum Body {
    /// No attempt has completed yet.
    Empty,
    Json(serde_json::Value),
    Text(String),
    Buffer(Bytes),
    Blob(Blob),
    /// Multipart payload passed through unmodified.
    Stream(Bytes),
    /// A non-JSON payload boxed as `{ key: inner }`.
    Boxed { key: &'static str, inner: Box<Body> },
    /// The failure of the attempt that produced this record.
    Error(Arc<FetchError>),
}

impl Body {
    pub fn boxed(key: &'static str, inner: Body) -> Self {
        Self::Boxed {
            key,
            inner: Box::new(inner),
        }
    }

    pub fn message(text: &str) -> Self {
        Self::Json(serde_json::json!({ "message": text }))
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&FetchError> {
        match self {
            Self::Error(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl PartialEq for Body {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Buffer(a), Self::Buffer(b)) | (Self::Stream(a), Self::Stream(b)) => a == b,
            (Self::Blob(a), Self::Blob(b)) => a == b,
            (
                Self::Boxed { key, inner },
                Self::Boxed {
                    key: other_key,
                    inner: other_inner,
                },
            ) => key == other_key && inner == other_inner,
            (Self::Error(a), Self::Error(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Body {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::Json(value) => value.serialize(serializer),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Buffer(bytes) | Self::Stream(bytes) => serializer.serialize_bytes(bytes),
            Self::Blob(blob) => blob.serialize(serializer),
            Self::Boxed { key, inner } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(key, inner)?;
                map.end()
            }
            Self::Error(error) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", &error.to_string())?;
                map.end()
            }
        }
    }
}

/// The uniform result of a retried call.
///
/// Every attempt produces a fresh record; only the last one is returned.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub body: Body,
    #[serde(serialize_with = "serialize_headers")]
    pub headers: Option<HeaderMap>,
    pub ok: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub redirected: bool,
    /// Request body supplied by the caller.
    pub input: Option<String>,
    pub attempt: u32,
}

impl NormalizedResponse {
    /// Template record for a call that has not completed an attempt yet.
    pub fn new(url: impl Into<String>, input: Option<String>) -> Self {
        Self {
            url: url.into(),
            status: TRANSPORT_FAILURE_STATUS,
            status_text: status_text(TRANSPORT_FAILURE_STATUS).to_owned(),
            body: Body::Empty,
            headers: None,
            ok: false,
            kind: "error".to_owned(),
            redirected: false,
            input,
            attempt: 0,
        }
    }

    /// Builds the record for a response the transport delivered.
    pub fn populate(&self, raw: RawResponse, return_json: bool) -> Result<Self, DecodeError> {
        let content_type = raw.content_type();
        let body = decode_body(content_type.as_deref(), raw.body, return_json)?;

        Ok(Self {
            url: raw.url,
            status: raw.status,
            status_text: status_text(raw.status).to_owned(),
            body,
            headers: Some(raw.headers),
            ok: raw.ok,
            kind: raw.kind,
            redirected: raw.redirected,
            input: self.input.clone(),
            attempt: self.attempt,
        })
    }

    /// Builds the record for an attempt that produced no usable response.
    pub fn populate_failure(&self, error: impl Into<FetchError>) -> Self {
        Self {
            body: Body::Error(Arc::new(error.into())),
            attempt: self.attempt,
            ..Self::new(self.url.clone(), self.input.clone())
        }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref()?.get(name)?.to_str().ok()
    }
}

fn serialize_headers<S: Serializer>(
    headers: &Option<HeaderMap>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let Some(headers) = headers else {
        return serializer.serialize_none();
    };

    let mut joined: BTreeMap<&str, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        match joined.get_mut(name.as_str()) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => {
                joined.insert(name.as_str(), value.into_owned());
            }
        }
    }
    joined.serialize(serializer)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{Body, NormalizedResponse, RawResponse, TransportError};

    #[test]
    fn new_record_is_a_pending_failure() {
        let record = NormalizedResponse::new("http://svc/a", Some("payload".to_owned()));
        assert_eq!(record.status, 599);
        assert_eq!(record.status_text, "Network Connect Timeout Error");
        assert_eq!(record.body, Body::Empty);
        assert!(!record.ok);
        assert_eq!(record.kind, "error");
        assert_eq!(record.attempt, 0);
    }

    #[test]
    fn populate_copies_transport_fields() {
        let template = NormalizedResponse::new("http://svc/a", Some("in".to_owned())).with_attempt(2);
        let mut raw = RawResponse::new(201, "http://svc/b", r#"{"id":7}"#)
            .with_header("Content-Type", "application/json; charset=utf-8");
        raw.redirected = true;

        let record = template.populate(raw, true).expect("must decode");

        assert_eq!(record.url, "http://svc/b");
        assert_eq!(record.status, 201);
        assert_eq!(record.status_text, "Created");
        assert!(record.ok);
        assert!(record.redirected);
        assert_eq!(record.kind, "default");
        assert_eq!(record.input.as_deref(), Some("in"));
        assert_eq!(record.attempt, 2);
        assert_eq!(record.body, Body::Json(json!({ "id": 7 })));
        assert_eq!(
            record.header("content-type"),
            Some("application/json; charset=utf-8")
        );
    }

    #[test]
    fn failure_record_drops_success_fields() {
        let template = NormalizedResponse::new("http://svc/a", None);
        let success = template
            .populate(
                RawResponse::new(200, "http://svc/redirected", "hi")
                    .with_header("Content-Type", "text/plain"),
                true,
            )
            .expect("must decode");

        let failure = success.populate_failure(TransportError::other("connection reset"));

        assert_eq!(failure.status, 599);
        assert!(!failure.ok);
        assert!(failure.headers.is_none());
        assert_eq!(failure.kind, "error");
        assert_eq!(
            failure.body.as_error().map(ToString::to_string).as_deref(),
            Some("transport error: connection reset")
        );
    }

    #[test]
    fn serializes_as_plain_record() {
        let record = NormalizedResponse::new("http://svc/a", None)
            .populate(
                RawResponse::new(200, "http://svc/a", "hello")
                    .with_header("Content-Type", "text/plain")
                    .with_header("X-Tag", "a")
                    .with_header("X-Tag", "b"),
                true,
            )
            .expect("must decode")
            .with_attempt(1);

        let value = serde_json::to_value(&record).expect("must serialize");
        assert_eq!(value["statusText"], json!("OK"));
        assert_eq!(value["body"], json!({ "text": "hello" }));
        assert_eq!(value["type"], json!("default"));
        assert_eq!(value["attempt"], json!(1));
        assert_eq!(value["headers"]["x-tag"], json!("a, b"));
        assert_eq!(value["input"], json!(null));
    }
}
