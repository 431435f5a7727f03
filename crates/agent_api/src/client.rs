use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::casing::{normalize, NamingConvention};
use crate::config::AgentApiConfig;
use crate::error::{parse_error_message, AgentApiError};
use crate::headers::{build_headers, ResponseKind};
use crate::stream::{ByteStream, TokenStream};
use crate::url::{is_http_base, join_endpoint};

#[derive(Debug)]
pub struct AgentApiClient {
    http: Client,
    config: AgentApiConfig,
}

impl AgentApiClient {
    pub fn new(config: AgentApiConfig) -> Result<Self, AgentApiError> {
        if !is_http_base(&config.base_url) {
            return Err(AgentApiError::InvalidBaseUrl(config.base_url.clone()));
        }
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(AgentApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AgentApiConfig {
        &self.config
    }

    pub fn endpoint(&self, resource: &str) -> String {
        join_endpoint(&self.config.base_url, resource)
    }

    pub fn build_headers(&self, kind: ResponseKind) -> Result<HeaderMap, AgentApiError> {
        let headers = build_headers(&self.config, kind);
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    AgentApiError::InvalidHeader(format!("bad name {key:?}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    AgentApiError::InvalidHeader(format!("bad value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    /// Build a request whose body, if any, is rewritten to wire convention.
    pub fn build_request(
        &self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
        kind: ResponseKind,
    ) -> Result<reqwest::RequestBuilder, AgentApiError> {
        let headers = self.build_headers(kind)?;
        let builder = self
            .http
            .request(method, self.endpoint(resource))
            .headers(headers);

        Ok(match body {
            Some(body) => {
                let payload = normalize(body, NamingConvention::Wire);
                let encoded = serde_json::to_vec(&payload).map_err(AgentApiError::Encode)?;
                builder.body(encoded)
            }
            None => builder,
        })
    }

    /// Issue one request and turn any non-success status into a transport error.
    #[instrument(skip(self, body))]
    pub async fn send(
        &self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
        kind: ResponseKind,
    ) -> Result<Response, AgentApiError> {
        let response = self
            .build_request(method, resource, body, kind)?
            .send()
            .await
            .map_err(|error| {
                warn!(
                    %error,
                    url = %self.endpoint(resource),
                    "request failed before a response arrived"
                );
                AgentApiError::transport(None, error.to_string())
            })?;

        let status = response.status();
        debug!(status = status.as_u16(), "response headers received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(&body);
        warn!(status = status.as_u16(), %message, "request rejected");
        Err(AgentApiError::transport(Some(status), message))
    }

    /// Structured request/response exchange.
    ///
    /// The response body is rewritten to caller convention; `204 No Content` and an empty
    /// body both yield `null`.
    pub async fn request(
        &self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
    ) -> Result<Value, AgentApiError> {
        let response = self.send(method, resource, body, ResponseKind::Json).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let bytes = response.bytes().await.map_err(|error| {
            AgentApiError::decode(format!("response body unreadable: {error}"))
        })?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        let value = serde_json::from_slice::<Value>(&bytes)
            .map_err(|error| AgentApiError::decode(format!("response is not JSON: {error}")))?;
        Ok(normalize(&value, NamingConvention::Caller))
    }

    /// POST `body` and return a token stream over the framed response.
    pub async fn stream(
        &self,
        resource: &str,
        body: &Value,
    ) -> Result<TokenStream<ByteStream>, AgentApiError> {
        let response = self
            .send(Method::POST, resource, Some(body), ResponseKind::EventStream)
            .await?;
        Ok(TokenStream::new(byte_stream(response)))
    }
}

fn byte_stream(response: Response) -> ByteStream {
    Box::pin(response.bytes_stream().map(|chunk| {
        chunk
            .map(|bytes| bytes.to_vec())
            .map_err(|error| AgentApiError::decode(format!("response body unreadable: {error}")))
    }))
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::AgentApiClient;
    use crate::config::AgentApiConfig;
    use crate::error::AgentApiError;
    use crate::headers::ResponseKind;

    #[test]
    fn build_request_rewrites_body_to_wire_convention() {
        let client =
            AgentApiClient::new(AgentApiConfig::new("http://localhost:8000/")).expect("client");
        let request = client
            .build_request(
                Method::POST,
                "/api/v1/agents/a1/execute",
                Some(&json!({"userInput": "hi", "nested": [{"tokensUsed": 1}]})),
                ResponseKind::Json,
            )
            .expect("builder")
            .build()
            .expect("request");

        assert_eq!(
            request.url().as_str(),
            "http://localhost:8000/api/v1/agents/a1/execute"
        );
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(
            request.headers().get("content-type").expect("content type"),
            "application/json"
        );
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .expect("buffered body");
        let sent: serde_json::Value = serde_json::from_slice(body).expect("json body");
        assert_eq!(sent, json!({"user_input": "hi", "nested": [{"tokens_used": 1}]}));
    }

    #[test]
    fn build_request_without_body_sends_none() {
        let client = AgentApiClient::new(AgentApiConfig::default()).expect("client");
        let request = client
            .build_request(Method::GET, "api/v1/agents", None, ResponseKind::Json)
            .expect("builder")
            .build()
            .expect("request");
        assert!(request.body().is_none());
        assert_eq!(request.url().path(), "/api/v1/agents");
    }

    #[test]
    fn stream_requests_accept_event_stream() {
        let client = AgentApiClient::new(AgentApiConfig::default()).expect("client");
        let request = client
            .build_request(Method::POST, "x", Some(&json!({})), ResponseKind::EventStream)
            .expect("builder")
            .build()
            .expect("request");
        assert_eq!(
            request.headers().get("accept").expect("accept"),
            "text/event-stream"
        );
    }

    #[test]
    fn unusable_extra_header_fails_the_request() {
        let client =
            AgentApiClient::new(AgentApiConfig::default().insert_header("x-trace", "a\nb"))
                .expect("client");
        let error = client
            .build_request(Method::GET, "x", None, ResponseKind::Json)
            .expect_err("newline in header value");
        assert!(matches!(error, AgentApiError::InvalidHeader(_)));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let error = AgentApiClient::new(AgentApiConfig::new("ftp://example.com"))
            .expect_err("ftp base should be rejected");
        assert!(matches!(error, AgentApiError::InvalidBaseUrl(_)));
    }
}
