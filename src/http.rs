//! Outbound HTTP plumbing shared by every ATS call: the transport seam,
//! the process-wide pacing gate, and the retry policy.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ScrapeError;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtsRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl AtsRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

// --- Transport trait ---

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request. Non-2xx statuses are returned, not raised.
    async fn execute(&self, request: &AtsRequest) -> Result<HttpReply, ScrapeError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &AtsRequest) -> Result<HttpReply, ScrapeError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

// --- Pacing gate ---

#[async_trait]
pub trait RateGate: Send + Sync {
    /// Wait until the next outbound request may leave.
    async fn acquire(&self);
}

/// Enforces a minimum spacing between consecutive requests across the
/// whole process, whichever platform they target.
pub struct IntervalGate {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl IntervalGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl RateGate for IntervalGate {
    async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }
}

pub struct NoopGate;

#[async_trait]
impl RateGate for NoopGate {
    async fn acquire(&self) {}
}

// --- Retry policy ---

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff with up to 50% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = (base.as_millis() / 2) as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        base + Duration::from_millis(jitter)
    }
}

/// Everything an adapter needs to talk to an ATS: transport, the shared
/// gate, and the retry policy.
#[derive(Clone)]
pub struct AtsClient {
    transport: Arc<dyn Transport>,
    gate: Arc<dyn RateGate>,
    retry: RetryPolicy,
}

impl AtsClient {
    pub fn new(transport: Arc<dyn Transport>, gate: Arc<dyn RateGate>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            gate,
            retry,
        }
    }

    /// One paced, time-bounded attempt. Non-2xx becomes `ScrapeError::Status`.
    pub async fn send_once(&self, request: &AtsRequest) -> Result<HttpReply, ScrapeError> {
        self.gate.acquire().await;
        tracing::debug!(method = ?request.method, url = %request.url, "Sending ATS request");

        let timeout = self.retry.request_timeout;
        let reply = match tokio::time::timeout(timeout, self.transport.execute(request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ScrapeError::Transport(format!(
                    "request to {} timed out after {:?}",
                    request.url,
                    timeout
                )));
            }
        };

        if !(200..300).contains(&reply.status) {
            return Err(ScrapeError::Status {
                status: reply.status,
                url: request.url.clone(),
            });
        }
        Ok(reply)
    }

    /// `send_once` with retries on transient failures.
    pub async fn send(&self, request: &AtsRequest) -> Result<HttpReply, ScrapeError> {
        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        url = %request.url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient ATS failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
