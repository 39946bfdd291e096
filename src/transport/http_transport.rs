use std::time::Duration;

use crate::config::ServerConfig;
use crate::error::PlaygroundError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn build_reqwest_client(
    pool_max_idle_per_host: usize,
    timeout: Duration,
) -> Result<reqwest::Client, PlaygroundError> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(pool_max_idle_per_host)
        .tcp_nodelay(true)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .build()
        .map_err(|err| PlaygroundError::Transport(format!("Failed to build HTTP client: {err}")))
}

/// Pooled HTTP client for upstream calls. Requests are never retried.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with pooling and timeouts from the given server config.
    ///
    /// # Errors
    ///
    /// Returns [`PlaygroundError::Transport`] when the TLS backend cannot be initialised.
    pub fn new(config: &ServerConfig) -> Result<Self, PlaygroundError> {
        let client = build_reqwest_client(
            config.http_pool_max_idle_per_host.max(1),
            Duration::from_secs(config.timeout),
        )?;
        Ok(Self { client })
    }

    /// Send a request; the caller reads the body, buffered or as a stream.
    ///
    /// # Errors
    ///
    /// Returns [`PlaygroundError::Transport`] when URL parsing or request
    /// execution fails. Non-success statuses are returned as `Ok`.
    pub async fn send_request(
        &self,
        url: &str,
        method: http::Method,
        headers: http::HeaderMap,
        body: Option<bytes::Bytes>,
    ) -> Result<reqwest::Response, PlaygroundError> {
        let parsed_url = url::Url::parse(url)
            .map_err(|err| PlaygroundError::Transport(format!("Invalid upstream URL '{url}': {err}")))?;
        let mut request = reqwest::Request::new(method, parsed_url);
        *request.headers_mut() = headers;
        if let Some(body) = body {
            *request.body_mut() = Some(reqwest::Body::from(body));
        }

        self.client
            .execute(request)
            .await
            .map_err(|err| PlaygroundError::Transport(err.to_string()))
    }
}
