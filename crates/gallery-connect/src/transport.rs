//! HTTP transport for the Connect API
//!
//! Every request carries the `client_id` header; authenticated requests add a
//! bearer token. Responses are returned as parsed JSON. The transport never
//! retries; see [`crate::retry`] for the policy applied by the pipeline.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{ConnectError, Result, TransportError};
use crate::types::AccessToken;

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://connect-api.cloud.huawei.com";

/// Header carrying the client identity on every request
pub const CLIENT_ID_HEADER: &str = "client_id";

/// Connection settings for the transport
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API host, without a trailing path
    pub base_url: String,

    /// Whole-request timeout, including the artifact upload
    pub timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientOptions {
    /// Options pointing at a different host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client bound to one client identity
pub struct HttpTransport {
    client: Client,
    base_url: String,
    client_id: String,
}

impl HttpTransport {
    /// Create a transport for `client_id`
    pub fn new(options: &ClientOptions, client_id: impl Into<String>) -> Result<Self> {
        let base = Url::parse(&options.base_url).map_err(|e| {
            ConnectError::Configuration(format!("invalid base URL '{}': {}", options.base_url, e))
        })?;

        let client = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| ConnectError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
        })
    }

    /// Absolute URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// GET an API path
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&AccessToken>,
    ) -> std::result::Result<Value, TransportError> {
        let request = self.request(Method::GET, &self.endpoint(path), token).query(query);
        self.send(request).await
    }

    /// POST a JSON body to an API path
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
        token: Option<&AccessToken>,
    ) -> std::result::Result<Value, TransportError> {
        let request = self
            .request(Method::POST, &self.endpoint(path), token)
            .query(query)
            .json(body);
        self.send(request).await
    }

    /// PUT a JSON body to an API path
    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
        token: Option<&AccessToken>,
    ) -> std::result::Result<Value, TransportError> {
        let request = self
            .request(Method::PUT, &self.endpoint(path), token)
            .query(query)
            .json(body);
        self.send(request).await
    }

    /// POST with an empty JSON-typed body
    pub async fn post_empty(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&AccessToken>,
    ) -> std::result::Result<Value, TransportError> {
        let request = self
            .request(Method::POST, &self.endpoint(path), token)
            .query(query)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body("");
        self.send(request).await
    }

    /// POST a multipart form to an absolute URL
    pub async fn post_multipart(
        &self,
        url: &str,
        form: Form,
        token: Option<&AccessToken>,
    ) -> std::result::Result<Value, TransportError> {
        let request = self.request(Method::POST, url, token).multipart(form);
        self.send(request).await
    }

    fn request(&self, method: Method, url: &str, token: Option<&AccessToken>) -> RequestBuilder {
        debug!("Making {} request to {}", method, url);

        let request = self
            .client
            .request(method, url)
            .header(CLIENT_ID_HEADER, &self.client_id);

        match token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token.as_str())),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> std::result::Result<Value, TransportError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "request failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_body(body)
    }
}

/// Parse a success body, surfacing the in-band `ret` error envelope
fn parse_body(body: String) -> std::result::Result<Value, TransportError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(source) => return Err(TransportError::Decode { body, source }),
    };

    if let Some(ret) = value.get("ret") {
        let code = ret.get("code").and_then(Value::as_i64).unwrap_or(0);
        if code != 0 {
            let message = ret
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(TransportError::Api { code, message });
        }
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn transport(server: &Server) -> HttpTransport {
        let options = ClientOptions::default().with_base_url(server.url());
        HttpTransport::new(&options, "client-42").unwrap()
    }

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(parse_body(String::new()).unwrap(), Value::Null);
        assert_eq!(
            parse_body(r#"{"ret":{"code":0,"msg":"success"}}"#.to_string()).unwrap()["ret"]["msg"],
            "success"
        );

        match parse_body(r#"{"ret":{"code":204144660,"msg":"invalid appId"}}"#.to_string()) {
            Err(TransportError::Api { code, message }) => {
                assert_eq!(code, 204144660);
                assert_eq!(message, "invalid appId");
            }
            other => panic!("unexpected: {:?}", other),
        }

        match parse_body("<html>oops</html>".to_string()) {
            Err(TransportError::Decode { body, .. }) => assert_eq!(body, "<html>oops</html>"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let options = ClientOptions::default().with_base_url("not a url");
        let err = HttpTransport::new(&options, "client").err().unwrap();
        assert!(matches!(err, ConnectError::Configuration(_)));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let options = ClientOptions::default().with_base_url("https://proxy.example.com/agc/");
        let transport = HttpTransport::new(&options, "client").unwrap();
        assert_eq!(
            transport.endpoint("/api/oauth2/v1/token"),
            "https://proxy.example.com/agc/api/oauth2/v1/token"
        );
    }

    #[tokio::test]
    async fn test_get_sends_client_id_and_bearer() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/thing")
            .match_query(Matcher::UrlEncoded("appId".into(), "1234".into()))
            .match_header("client_id", "client-42")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value":1}"#)
            .create_async()
            .await;

        let value = transport(&server)
            .get("/api/thing", &[("appId", "1234")], Some(&AccessToken::new("tok")))
            .await
            .unwrap();
        assert_eq!(value["value"], 1);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthenticated_post_has_no_authorization() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/token")
            .match_header("client_id", "client-42")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(serde_json::json!({"a": "b"})))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let value = transport(&server)
            .post_json("/api/token", &[], &serde_json::json!({"a": "b"}), None)
            .await
            .unwrap();
        assert_eq!(value["ok"], true);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_keeps_raw_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/thing")
            .with_status(403)
            .with_body("forbidden by policy")
            .create_async()
            .await;

        let err = transport(&server)
            .put_json("/api/thing", &[], &serde_json::json!({}), Some(&AccessToken::new("t")))
            .await
            .unwrap_err();

        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden by policy");
            }
            other => panic!("unexpected: {:?}", other),
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_empty_accepts_empty_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/submit")
            .match_body("")
            .with_status(200)
            .create_async()
            .await;

        let value = transport(&server)
            .post_empty("/api/submit", &[], Some(&AccessToken::new("t")))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);

        mock.assert_async().await;
    }
}
