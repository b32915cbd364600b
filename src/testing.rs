//! Scripted in-memory transport shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::transport::{Operation, Request, Transport};

/// Scripted answer to one call.
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    Ok(Value),
    Err(TransportError),
    /// Answers after the delay, ignoring the token.
    Late(Duration, Value),
}

/// Pops one scripted reply per call and operation. With nothing scripted the
/// call blocks until its token is cancelled, like an idle long-poll.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<Operation, VecDeque<Reply>>>,
    requests: Mutex<Vec<Request>>,
    issued: Notify,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push(&self, operation: Operation, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, operation: Operation) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    /// Waits until at least `n` calls of `operation` were issued.
    pub(crate) async fn wait_for(&self, operation: Operation, n: usize) {
        loop {
            let notified = self.issued.notified();
            if self.count(operation) >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn issue(
        &self,
        request: Request,
        token: CancellationToken,
    ) -> Result<Value, TransportError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&request.operation)
            .and_then(VecDeque::pop_front);
        self.requests.lock().unwrap().push(request);
        self.issued.notify_waiters();

        match reply {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Err(err)) => Err(err),
            Some(Reply::Late(delay, value)) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            None => {
                token.cancelled().await;
                Err(TransportError::Cancelled)
            }
        }
    }
}

/// Subscribe response body with `envelopes` as the `m` array.
pub(crate) fn subscribe_body(timetoken: u64, region: u32, envelopes: Vec<Value>) -> Value {
    json!({"t": {"t": timetoken.to_string(), "r": region}, "m": envelopes})
}

/// Presence acknowledgement body.
pub(crate) fn ack() -> Value {
    json!({"status": 200, "message": "OK", "service": "Presence"})
}
