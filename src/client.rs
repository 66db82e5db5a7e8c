//! Capture API client
//!
//! HTTP client for the identity graph capture API. Submits node and
//! relationship batches, classifies failures into transient/permanent/auth,
//! and retries transient failures with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::LoaderError;
use crate::graph::{Node, Relationship};

/// Maximum number of attempts per batch (initial try plus retries).
pub const MAX_ATTEMPTS: u32 = 3;

/// Backoff before the first retry; doubles on each subsequent attempt.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// How much of an error response body to keep in failure reports.
const BODY_SNIPPET_LEN: usize = 500;

/// A destination that accepts batches of items.
///
/// The dispatcher works against this trait rather than the concrete HTTP
/// client, so tests can substitute a mock that counts calls or injects
/// failures. [`CaptureClient`] implements it for both [`Node`] and
/// [`Relationship`].
#[async_trait]
pub trait Submitter<T>: Send + Sync {
    /// Submits one batch. A returned error is final from the dispatcher's
    /// point of view: retries happen inside the implementation.
    async fn submit(&self, items: &[T]) -> Result<(), LoaderError>;
}

/// HTTP client for the capture API.
///
/// # Example
///
/// ```rust,ignore
/// use emissions_loader::client::CaptureClient;
///
/// let client = CaptureClient::new("https://api.indykite.com", "token")?;
/// client.submit(&nodes).await?;
/// ```
pub struct CaptureClient {
    http: reqwest::Client,
    host: String,
    token: String,
    max_attempts: u32,
    initial_backoff: Duration,
    dry_run: bool,
}

/// Request wrapper for the nodes endpoint; relationships post a bare array.
#[derive(Serialize)]
struct NodesPayload<'a> {
    nodes: &'a [Node],
}

impl CaptureClient {
    /// Creates a client for the given capture API host and bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Config`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(host: &str, token: &str) -> Result<Self, LoaderError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LoaderError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
            max_attempts: MAX_ATTEMPTS,
            initial_backoff: INITIAL_BACKOFF,
            dry_run: false,
        })
    }

    /// Overrides the retry policy. Used by tests to keep backoff short.
    #[must_use]
    pub fn with_retry_policy(mut self, max_attempts: u32, initial_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    /// Enables dry-run mode: requests are logged but not sent, and every
    /// batch reports success.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Posts a JSON body to a capture endpoint with retry on transient
    /// failure.
    async fn post_with_retry<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        count: usize,
    ) -> Result<(), LoaderError> {
        let url = format!("{}{}", self.host, path);

        if self.dry_run {
            println!(
                "  [dry-run] Skipping POST {} ({} items)",
                url, count
            );
            debug!(body = %serde_json::to_string(body)?, "dry-run payload");
            return Ok(());
        }

        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            match self.post_once(&url, body).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        "attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt, self.max_attempts, url, e, backoff
                    );
                    sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Issues a single POST and classifies the outcome.
    async fn post_once<B: Serialize>(&self, url: &str, body: &B) -> Result<(), LoaderError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| LoaderError::Transient {
                status: None,
                message: format!("request to {} failed: {}", url, e),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("POST {} -> {}", url, status);
            return Ok(());
        }

        let body_snippet = match response.text().await {
            Ok(text) => text.chars().take(BODY_SNIPPET_LEN).collect::<String>(),
            Err(_) => String::new(),
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(LoaderError::Auth(format!(
                "capture API rejected credentials ({}): {}",
                status, body_snippet
            ))),
            s if s.is_client_error() => Err(LoaderError::Permanent {
                status: Some(s.as_u16()),
                message: body_snippet,
            }),
            s => Err(LoaderError::Transient {
                status: Some(s.as_u16()),
                message: body_snippet,
            }),
        }
    }
}

#[async_trait]
impl Submitter<Node> for CaptureClient {
    async fn submit(&self, items: &[Node]) -> Result<(), LoaderError> {
        let payload = NodesPayload { nodes: items };
        self.post_with_retry("/capture/v1/nodes", &payload, items.len())
            .await
    }
}

#[async_trait]
impl Submitter<Relationship> for CaptureClient {
    async fn submit(&self, items: &[Relationship]) -> Result<(), LoaderError> {
        // Relationships are sent as a bare array, not wrapped in an object.
        self.post_with_retry("/capture/v1/relationships", &items, items.len())
            .await
    }
}
