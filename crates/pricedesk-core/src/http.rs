use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

/// Outbound GET request envelope used by the quote adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            // Upstream quote services occasionally stall; an unbounded wait
            // would leave the whole fetch pending forever.
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Response envelope returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level failure (connect, timeout, body read).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Adapter transport contract.
pub trait HttpClient: Send + Sync {
    fn get<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("pricedesk/0.1.0")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url).timeout(request.timeout);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::new(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::new(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Deterministic offline transport for tests.
///
/// Routes by URL substring in registration order; unmatched requests get a
/// 404. Every request is recorded so tests can assert that a denied call
/// never reached the network.
#[derive(Debug, Default)]
pub struct StubHttpClient {
    routes: Vec<(String, Result<HttpResponse, HttpError>)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url_fragment: impl Into<String>, response: HttpResponse) -> Self {
        self.routes.push((url_fragment.into(), Ok(response)));
        self
    }

    pub fn with_error(mut self, url_fragment: impl Into<String>, error: HttpError) -> Self {
        self.routes.push((url_fragment.into(), Err(error)));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .len()
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }
}

impl HttpClient for StubHttpClient {
    fn get<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request.clone());

        let outcome = self
            .routes
            .iter()
            .find(|(fragment, _)| request.url.contains(fragment.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| {
                Ok(HttpResponse {
                    status: 404,
                    body: String::from("{}"),
                })
            });

        Box::pin(async move { outcome })
    }
}
