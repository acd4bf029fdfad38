//! In-process transport for gateway tests. Enabled for downstream crates
//! with the `testing` feature.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{Value, json};

use crate::error::TransportError;
use crate::rpc::RpcRequest;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub enum Reply {
    Envelope { result: Value, error: Value },
    Status(u16),
    Raw(Value),
}

impl Reply {
    pub fn result(result: Value) -> Self {
        Reply::Envelope {
            result,
            error: Value::Null,
        }
    }

    pub fn error(error: Value) -> Self {
        Reply::Envelope {
            result: Value::Null,
            error,
        }
    }
}

/// Records every request and answers from a per-procedure reply table.
/// `authenticate` yields `SESSIONKEY123` and `release_token` yields `OK`
/// unless overridden; anything else answers `null`.
pub struct FakeTransport {
    requests: Mutex<Vec<RpcRequest>>,
    replies: Mutex<HashMap<String, Reply>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        let mut replies = HashMap::new();
        replies.insert(
            "authenticate".to_string(),
            Reply::result(json!("SESSIONKEY123")),
        );
        replies.insert("release_token".to_string(), Reply::result(json!("OK")));
        Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(replies),
            delay: None,
        }
    }

    pub fn reply(self, method: &str, reply: Reply) -> Self {
        self.set_reply(method, reply);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_reply(&self, method: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(method.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<RpcRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self, method: &str) -> Option<RpcRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method)
            .cloned()
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for FakeTransport {
    async fn send(&self, request: &RpcRequest) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&request.method)
            .cloned()
            .unwrap_or_else(|| Reply::result(Value::Null));

        match reply {
            Reply::Envelope { result, error } => Ok(json!({
                "id": request.id,
                "result": result,
                "error": error
            })),
            Reply::Status(status) => Err(TransportError::Status {
                status,
                body: String::new(),
            }),
            Reply::Raw(body) => Ok(body),
        }
    }
}
