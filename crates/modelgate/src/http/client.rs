//! JSON HTTP client with a per-attempt timeout and exponential backoff.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::error::{HttpError, parse_error_body};

const REDACTED: &str = "REDACTED";

// ============================================================================
// RetryPolicy
// ============================================================================

/// Delay schedule between attempts: `base * 2^attempt`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt with the given 0-based index.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

// ============================================================================
// RequestOptions
// ============================================================================

/// Per-request settings.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    /// Applied to each attempt separately.
    pub timeout: Duration,
    /// Extra attempts after the first one.
    pub retries: u32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            timeout: Self::DEFAULT_TIMEOUT,
            retries: 0,
        }
    }
}

impl RequestOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Set a header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HttpError::InvalidRequest(format!("invalid header name: {name}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| HttpError::InvalidRequest(format!("invalid value for header {name}")))?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn bearer(self, token: &str) -> Result<Self, HttpError> {
        self.header("Authorization", &format!("Bearer {token}"))
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self, HttpError> {
        let value = serde_json::to_value(body)
            .map_err(|e| HttpError::InvalidRequest(format!("unserializable body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

// ============================================================================
// Responses
// ============================================================================

/// A successful JSON response.
#[derive(Debug)]
pub struct HttpResponse<T> {
    pub data: T,
    pub status: u16,
    pub headers: HeaderMap,
}

/// A successful response kept as raw bytes.
#[derive(Debug)]
pub struct BytesResponse {
    pub data: Vec<u8>,
    pub status: u16,
    pub content_type: Option<String>,
}

struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

// ============================================================================
// HttpClient
// ============================================================================

/// Shared, connection-pooled HTTP client. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
}

impl HttpClient {
    #[must_use]
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Issue a request and parse the successful body as JSON.
    ///
    /// Parse failures are reported as [`HttpError::Malformed`] and never retried.
    pub async fn request<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse<T>, HttpError> {
        let raw = self.execute(url, &options).await?;
        let data = serde_json::from_slice(&raw.body).map_err(HttpError::Malformed)?;
        Ok(HttpResponse {
            data,
            status: raw.status.as_u16(),
            headers: raw.headers,
        })
    }

    /// Issue a request and return the successful body untouched.
    pub async fn fetch_bytes(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<BytesResponse, HttpError> {
        let raw = self.execute(url, &options).await?;
        let content_type = raw
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Ok(BytesResponse {
            data: raw.body,
            status: raw.status.as_u16(),
            content_type,
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse<T>, HttpError> {
        let options = RequestOptions {
            method: Method::GET,
            body: None,
            ..options
        };
        self.request(url, options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &impl Serialize,
        options: RequestOptions,
    ) -> Result<HttpResponse<T>, HttpError> {
        let options = RequestOptions {
            method: Method::POST,
            ..options
        }
        .json(body)?;
        self.request(url, options).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &impl Serialize,
        options: RequestOptions,
    ) -> Result<HttpResponse<T>, HttpError> {
        let options = RequestOptions {
            method: Method::PUT,
            ..options
        }
        .json(body)?;
        self.request(url, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse<T>, HttpError> {
        let options = RequestOptions {
            method: Method::DELETE,
            ..options
        };
        self.request(url, options).await
    }

    /// Run attempts until one succeeds, a final error occurs, or retries run out.
    ///
    /// Every attempt sends the same payload. Retrying a POST therefore means the
    /// upstream may see it up to `retries + 1` times.
    async fn execute(&self, url: &str, options: &RequestOptions) -> Result<RawResponse, HttpError> {
        let log_url = redact_url(url);
        let mut attempt = 0;
        loop {
            debug!(method = %options.method, url = %log_url, attempt, "Sending request");
            let err = match self.attempt(url, options).await {
                Ok(raw) => return Ok(raw),
                Err(err) => err,
            };

            if attempt >= options.retries || !err.is_retryable() {
                return Err(err);
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                url = %log_url,
                attempt,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, url: &str, options: &RequestOptions) -> Result<RawResponse, HttpError> {
        let mut builder = self
            .client
            .request(options.method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .headers(options.headers.clone());

        if let Some(ref body) = options.body
            && options.method != Method::GET
        {
            builder = builder.json(body);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?.to_vec();
            Ok::<_, HttpError>(RawResponse {
                status,
                headers,
                body,
            })
        };

        let raw = tokio::time::timeout(options.timeout, exchange)
            .await
            .map_err(|_| HttpError::Timeout(options.timeout))??;

        if !raw.status.is_success() {
            return Err(HttpError::Status {
                status: raw.status.as_u16(),
                reason: raw
                    .status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
                body: parse_error_body(&raw.body),
            });
        }

        Ok(raw)
    }
}

/// Copy of `url` for logs with the `key` query parameter masked.
fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !parsed.query_pairs().any(|(name, _)| name == "key") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "key" {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.into()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client() -> HttpClient {
        HttpClient::new(
            Client::new(),
            RetryPolicy {
                base_delay: Duration::from_millis(20),
                max_delay: Duration::from_secs(1),
            },
        )
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(10), Duration::from_secs(30));
        assert_eq!(policy.delay_for(64), Duration::from_secs(30));
    }

    #[test]
    fn default_options() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.retries, 0);
        assert!(options.body.is_none());
    }

    #[test]
    fn invalid_header_is_an_error() {
        let err = RequestOptions::default()
            .bearer("line\nbreak")
            .unwrap_err();
        assert!(matches!(err, HttpError::InvalidRequest(_)));
        assert!(!err.is_retryable());

        let err = RequestOptions::default().header("bad name", "x").unwrap_err();
        assert!(matches!(err, HttpError::InvalidRequest(_)));
    }

    #[test]
    fn unserializable_body_is_an_error() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "tuple keys are not valid JSON object keys");

        let err = RequestOptions::default().json(&map).unwrap_err();
        assert!(matches!(err, HttpError::InvalidRequest(_)));
    }

    #[test]
    fn key_query_parameter_is_redacted() {
        let redacted = redact_url("https://g.example/models/m:generateContent?key=s3cret&alt=json");
        assert!(!redacted.contains("s3cret"));
        assert!(redacted.contains("key=REDACTED"));
        assert!(redacted.contains("alt=json"));

        let plain = "https://api.example/v1/chat/completions";
        assert_eq!(redact_url(plain), plain);
    }

    #[tokio::test]
    async fn network_error_hides_url() {
        let err = fast_client()
            .get::<Value>("http://127.0.0.1:1/x?key=s3cret", RequestOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Network(_)));
        assert!(!err.to_string().contains("s3cret"));
    }

    #[tokio::test]
    async fn parses_json_and_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("Content-Type", "application/json"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({"ping": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-request-id", "abc")
                    .set_body_json(serde_json::json!({"pong": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response: HttpResponse<Value> = fast_client()
            .post(
                &format!("{}/echo", server.uri()),
                &serde_json::json!({"ping": true}),
                RequestOptions::default().bearer("secret").unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.data["pong"], true);
        assert_eq!(response.headers.get("x-request-id").unwrap(), "abc");
    }

    #[tokio::test]
    async fn put_and_delete_use_their_methods() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/item"))
            .and(body_partial_json(serde_json::json!({"name": "fox"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": 1})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/item"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": 2})))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client();
        let url = format!("{}/item", server.uri());
        let put: HttpResponse<Value> = client
            .put(&url, &serde_json::json!({"name": "fox"}), RequestOptions::default())
            .await
            .unwrap();
        let deleted: HttpResponse<Value> =
            client.delete(&url, RequestOptions::default()).await.unwrap();

        assert_eq!(put.data["ok"], 1);
        assert_eq!(deleted.data["ok"], 2);
    }

    #[tokio::test]
    async fn retries_server_errors_with_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let started = Instant::now();
        let response: HttpResponse<Value> = fast_client()
            .get(
                &format!("{}/flaky", server.uri()),
                RequestOptions::default().retries(2),
            )
            .await
            .unwrap();

        assert_eq!(response.data["ok"], 1);
        // 20ms after the first failure, 40ms after the second.
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn gives_up_after_last_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let err = fast_client()
            .get::<Value>(&server.uri(), RequestOptions::default().retries(2))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(err.body(), Some(&Value::String("boom".to_string())));
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": {"message": "no such model"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = fast_client()
            .get::<Value>(&server.uri(), RequestOptions::default().retries(3))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
        assert_eq!(err.body().unwrap()["error"]["message"], "no such model");
    }

    #[tokio::test]
    async fn malformed_body_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = fast_client()
            .get::<Value>(&server.uri(), RequestOptions::default().retries(3))
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Malformed(_)));
    }

    #[tokio::test]
    async fn slow_attempts_time_out_and_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .expect(2)
            .mount(&server)
            .await;

        let err = fast_client()
            .get::<Value>(
                &server.uri(),
                RequestOptions::default()
                    .timeout(Duration::from_millis(50))
                    .retries(1),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Timeout(_)));
        assert_eq!(err.status(), Some(408));
    }

    #[tokio::test]
    async fn network_failure_has_no_status() {
        let err = fast_client()
            .get::<Value>("http://127.0.0.1:1", RequestOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Network(_)));
        assert_eq!(err.status(), None);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn fetch_bytes_keeps_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.webp"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/webp"),
            )
            .mount(&server)
            .await;

        let response = fast_client()
            .fetch_bytes(
                &format!("{}/cat.webp", server.uri()),
                RequestOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.data, vec![1, 2, 3]);
        assert_eq!(response.content_type.as_deref(), Some("image/webp"));
    }
}
