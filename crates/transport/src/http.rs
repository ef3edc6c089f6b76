//! reqwest-backed [`Transport`].

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::trace;

use crate::{BoxFuture, Method, Request, Response, Transport, TransportConfig, TransportError};

/// HTTP transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Builds a transport from an explicit configuration.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let headers = header_map(&config.default_headers)?;

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };
        let timeout = request.timeout.unwrap_or(self.config.timeout);

        let mut builder = self
            .http
            .request(method, &request.url)
            .headers(header_map(&request.headers)?)
            .timeout(timeout);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        trace!(method = %request.method, url = %request.url, "sending request");

        let resp = builder.send().await.map_err(|e| map_error(e, timeout))?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| map_error(e, timeout))?;

        trace!(status, bytes = body.len(), "response received");

        Ok(Response {
            status,
            body: body.to_vec(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        Box::pin(self.execute(request))
    }
}

fn map_error(err: reqwest::Error, timeout: std::time::Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Http(err)
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let key = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
        let val = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        map.append(key, val);
    }
    Ok(map)
}
