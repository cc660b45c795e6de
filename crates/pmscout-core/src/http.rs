//! Blocking HTTP GET over a shared async client.
//!
//! Uses async reqwest internally on a small shared tokio runtime, but presents
//! a sync interface so rayon workers can call it directly.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from a single HTTP request
#[derive(Debug, Clone)]
pub struct HttpError {
    /// Status code, `None` for transport failures (DNS, connect, timeout, body)
    pub status: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(s) => write!(f, "HTTP {s}: {}", self.message),
            None => write!(f, "HTTP error: {}", self.message),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Build from a reqwest error, dropping the URL (query strings end up in logs)
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url().to_string(),
        }
    }

    /// Transport failures, rate limiting and server errors are worth retrying.
    /// Any other status means the request itself is wrong.
    pub fn is_retryable(&self) -> bool {
        match self.status {
            None => true,
            Some(429) => true,
            Some(s) => (500..=599).contains(&s),
        }
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .user_agent(concat!("pmscout/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// GET `url` with query parameters and return the body as text.
///
/// Non-success statuses are errors. `timeout` covers the whole request
/// including the body.
pub fn get_text(url: &str, params: &[(&str, &str)], timeout: Duration) -> Result<String, HttpError> {
    SHARED_RUNTIME.handle().block_on(async {
        let response = SHARED_CLIENT
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(HttpError::from_reqwest)?;
        response.text().await.map_err(HttpError::from_reqwest)
    })
}
