use std::future::Future;

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, Url,
};

use crate::{RetrierOptions, TransportError};

/// Per-call request description.
///
/// Transport options travel to the [`Transport`] untouched; the optional
/// `retrier_options` override the retrier's defaults for this call only.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub method: Method,
    pub headers: HeaderMap,
    /// Request body, echoed back as the record's `input`.
    pub body: Option<String>,
    pub retrier_options: Option<RetrierOptions>,
}

impl Request {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn retrier_options(mut self, options: RetrierOptions) -> Self {
        self.retrier_options = Some(options);
        self
    }
}

/// Fully-read response handed back by a [`Transport`].
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    /// Case-insensitive header map.
    pub headers: HeaderMap,
    pub ok: bool,
    /// Final URL after redirects.
    pub url: String,
    pub redirected: bool,
    /// Response classification, `"default"` for ordinary responses.
    pub kind: String,
    pub body: Bytes,
}

impl RawResponse {
    /// Builds a response for `url` with `ok` derived from `status`.
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            ok: is_ok_status(status),
            url: url.into(),
            redirected: false,
            kind: "default".to_owned(),
            body: body.into(),
        }
    }

    /// Appends a header; invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Declared `Content-Type`, if any.
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
    }
}

fn is_ok_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// Issues one network request and reads the whole response.
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        request: &Request,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (proxies, TLS, transport timeouts).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    async fn fetch(&self, url: &str, request: &Request) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let final_url = response.url().clone();
        let redirected = Url::parse(url).is_ok_and(|requested| requested != final_url);
        let body = response.bytes().await?;

        Ok(RawResponse {
            status,
            headers,
            ok: is_ok_status(status),
            url: final_url.to_string(),
            redirected,
            kind: "default".to_owned(),
            body,
        })
    }
}
