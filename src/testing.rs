//! Scripted transport for exercising adapters, discovery and the
//! orchestrator without touching the network.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::ScrapeError;
use crate::http::{AtsRequest, HttpReply, Transport};

#[derive(Debug, Clone)]
pub enum MockReply {
    Json { status: u16, body: String },
    /// Never completes; only the request timeout ends it.
    Hang,
    Fail(String),
}

impl MockReply {
    pub fn json(status: u16, body: &str) -> Self {
        MockReply::Json {
            status,
            body: body.to_string(),
        }
    }

    pub fn ok(body: serde_json::Value) -> Self {
        MockReply::Json {
            status: 200,
            body: body.to_string(),
        }
    }
}

/// Replies are keyed by exact URL and consumed in order; the last reply for
/// a URL repeats. Unrouted URLs answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<MockReply>>>,
    calls: Mutex<Vec<AtsRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, reply: MockReply) -> Self {
        self.route_sequence(url, vec![reply])
    }

    pub fn route_sequence(self, url: &str, replies: Vec<MockReply>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<AtsRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|r| r.url == url).count()
    }

    fn next_reply(&self, url: &str) -> Option<MockReply> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &AtsRequest) -> Result<HttpReply, ScrapeError> {
        self.calls.lock().unwrap().push(request.clone());

        match self.next_reply(&request.url) {
            None => Ok(HttpReply {
                status: 404,
                body: String::new(),
            }),
            Some(MockReply::Json { status, body }) => Ok(HttpReply { status, body }),
            Some(MockReply::Fail(msg)) => Err(ScrapeError::Transport(msg)),
            Some(MockReply::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}
