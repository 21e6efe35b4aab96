//! HTTP transport types and the executor seam.
//!
//! # Design
//! The client builds `HttpRequest` values and parses `HttpResponse` values as
//! plain data. Actually moving bytes is delegated to an `HttpExecutor`, which
//! keeps request construction and response mapping deterministic and lets
//! tests substitute a scripted executor for the network.
//!
//! Query parameters stay structured as `(key, value)` pairs; encoding them
//! into the URL is the executor's job.

use crate::error::{MochiError, Result};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Look up a query parameter by key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one `HttpRequest` synchronously.
///
/// Implementations return non-2xx responses as data; only failures that
/// prevent a response from arriving at all should become `Err`.
pub trait HttpExecutor {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

impl<E: HttpExecutor + ?Sized> HttpExecutor for &E {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_executor::{UreqExecutor, DEFAULT_TIMEOUT};

#[cfg(feature = "ureq")]
mod ureq_executor {
    use std::time::Duration;

    use super::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse};
    use crate::error::{MochiError, Result};

    /// Per-request timeout applied to every call.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Blocking executor backed by a `ureq` agent.
    ///
    /// Status-code-as-error is disabled so 4xx/5xx responses come back as
    /// data and the client does the status interpretation.
    #[derive(Clone)]
    pub struct UreqExecutor {
        agent: ureq::Agent,
    }

    impl UreqExecutor {
        pub fn new() -> Self {
            Self::with_timeout(DEFAULT_TIMEOUT)
        }

        pub fn with_timeout(timeout: Duration) -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl std::fmt::Debug for UreqExecutor {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("UreqExecutor").finish_non_exhaustive()
        }
    }

    impl Default for UreqExecutor {
        fn default() -> Self {
            Self::new()
        }
    }

    fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    impl HttpExecutor for UreqExecutor {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            let result = match request.method {
                HttpMethod::Get => decorate(self.agent.get(&request.url), &request).call(),
                HttpMethod::Delete => decorate(self.agent.delete(&request.url), &request).call(),
                HttpMethod::Post => {
                    let builder = decorate(self.agent.post(&request.url), &request);
                    match &request.body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };
            let mut response = result.map_err(|e| MochiError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| MochiError::Transport(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

/// Extract the service-provided `"message"` from an error body, if any.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Map non-success status codes to the appropriate `MochiError` variant.
pub(crate) fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    tracing::warn!(status = response.status, "non-success status from Mochi");
    match response.status {
        401 => Err(MochiError::Authentication),
        404 => Err(MochiError::NotFound),
        status => Err(MochiError::Service {
            status,
            message: error_message(&response.body),
        }),
    }
}
