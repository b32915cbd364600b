//! End-to-end flow through the public API with an in-memory service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use pubsub_engine::transport::Operation;
use pubsub_engine::{
    Config, Cursor, EngineError, Listener, Message, PresenceAction, PresenceEvent, ReconnectionPolicy, Request,
    Status, StatusCategory, SubscribeState, Subscription, SubscriptionManager, Transport,
    TransportError,
};

/// Answers subscribe calls from a queue; an empty queue behaves like an idle long-poll.
#[derive(Default)]
struct FakeService {
    subscribe: Mutex<VecDeque<Result<Value, TransportError>>>,
    seen: Mutex<Vec<Request>>,
}

impl FakeService {
    fn reply(&self, reply: Result<Value, TransportError>) {
        self.subscribe.lock().unwrap().push_back(reply);
    }

    fn seen(&self, operation: Operation) -> Vec<Request> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.operation == operation)
            .cloned()
            .collect()
    }

    async fn until(&self, operation: Operation, n: usize) {
        while self.seen(operation).len() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Transport for FakeService {
    async fn issue(&self, request: Request, token: CancellationToken) -> Result<Value, TransportError> {
        let operation = request.operation;
        self.seen.lock().unwrap().push(request);
        match operation {
            Operation::Subscribe => {
                let next = self.subscribe.lock().unwrap().pop_front();
                match next {
                    Some(reply) => reply,
                    None => {
                        token.cancelled().await;
                        Err(TransportError::Cancelled)
                    }
                }
            }
            Operation::Leave | Operation::Heartbeat => Ok(json!({"status": 200, "message": "OK"})),
        }
    }
}

/// Panics on every call.
struct BrokenService;

#[async_trait]
impl Transport for BrokenService {
    async fn issue(&self, _request: Request, _token: CancellationToken) -> Result<Value, TransportError> {
        panic!("transport bug");
    }
}

#[derive(Default)]
struct Recorder {
    messages: Mutex<Vec<Message>>,
    presence: Mutex<Vec<PresenceEvent>>,
    statuses: Mutex<Vec<Status>>,
}

impl Listener for Recorder {
    fn on_message(&self, message: &Message) {
        self.messages.lock().unwrap().push(message.clone());
    }

    fn on_presence(&self, event: &PresenceEvent) {
        self.presence.lock().unwrap().push(event.clone());
    }

    fn on_status(&self, status: &Status) {
        self.statuses.lock().unwrap().push(status.clone());
    }
}

fn page(timetoken: u64, messages: Value) -> Value {
    json!({"t": {"t": timetoken.to_string(), "r": 3}, "m": messages})
}

fn start(config: Config) -> (SubscriptionManager, Arc<FakeService>, Arc<Recorder>) {
    let service = Arc::new(FakeService::default());
    let recorder = Arc::new(Recorder::default());
    let manager = SubscriptionManager::new(config, service.clone()).unwrap();
    manager.add_listener(recorder.clone());
    (manager, service, recorder)
}

#[tokio::test]
async fn subscribe_receive_and_unsubscribe() {
    let (manager, service, recorder) = start(Config::new("demo"));
    service.reply(Ok(page(100, json!([]))));
    service.reply(Ok(page(
        101,
        json!([
            {"c": "chat", "d": {"text": "hi"}, "p": {"t": "101", "r": 3}},
            {"c": "chat-pnpres", "d": {"action": "join", "uuid": "bob", "occupancy": 2}}
        ]),
    )));

    manager
        .subscribe(Subscription::new().channels(["chat"]).with_presence())
        .unwrap();
    service.until(Operation::Subscribe, 3).await;

    assert_eq!(manager.state(), SubscribeState::Receiving);
    assert_eq!(manager.snapshot().context.cursor, Cursor::new(101, 3));

    let messages = recorder.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].payload, json!({"text": "hi"}));
    assert_eq!(messages[0].timetoken, Some(101));

    let presence = recorder.presence.lock().unwrap().clone();
    assert_eq!(presence.len(), 1);
    assert_eq!(presence[0].channel, "chat");
    assert_eq!(presence[0].action, PresenceAction::Join);

    manager.unsubscribe_all().unwrap();
    manager
        .wait_for(|s| s == SubscribeState::Unsubscribed)
        .await
        .unwrap();
    service.until(Operation::Leave, 1).await;

    let leave = &service.seen(Operation::Leave)[0];
    assert_eq!(leave.path_string(), "/v2/presence/sub-key/demo/channel/chat/leave");

    let categories: Vec<_> = recorder
        .statuses
        .lock()
        .unwrap()
        .iter()
        .map(|s| s.category)
        .collect();
    assert_eq!(
        categories,
        vec![StatusCategory::Connected, StatusCategory::Disconnected]
    );
    assert!(manager.subscribed_channels().is_empty());
    manager.shutdown().await;
}

#[tokio::test]
async fn catch_up_skips_the_handshake() {
    let (manager, service, _) = start(Config::new("demo"));

    manager
        .subscribe(
            Subscription::new()
                .channels(["chat"])
                .from_cursor(Cursor::new(42, 7)),
        )
        .unwrap();
    service.until(Operation::Subscribe, 1).await;

    let request = &service.seen(Operation::Subscribe)[0];
    assert_eq!(request.query_value("tt"), Some("42"));
    assert_eq!(request.query_value("tr"), Some("7"));
    assert_eq!(manager.state(), SubscribeState::Receiving);
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_the_retry_budget() {
    let mut config = Config::new("demo");
    config.reconnection_policy = ReconnectionPolicy::linear();
    config.maximum_reconnection_retries = Some(2);
    let (manager, service, recorder) = start(config);
    for _ in 0..4 {
        service.reply(Err(TransportError::Network {
            message: "connection reset".into(),
        }));
    }

    manager
        .subscribe(Subscription::new().channels(["chat"]))
        .unwrap();
    manager
        .wait_for(|s| s == SubscribeState::HandshakeFailed)
        .await
        .unwrap();

    // first call plus two retries
    assert_eq!(service.seen(Operation::Subscribe).len(), 3);
    let statuses = recorder.statuses.lock().unwrap().clone();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].category, StatusCategory::Disconnected);
    assert!(statuses[0].is_error());
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn panicking_transport_fails_the_loop_instead_of_stalling_it() {
    let mut config = Config::new("demo");
    config.reconnection_policy = ReconnectionPolicy::linear();
    let recorder = Arc::new(Recorder::default());
    let manager = SubscriptionManager::new(config, Arc::new(BrokenService)).unwrap();
    manager.add_listener(recorder.clone());

    manager
        .subscribe(Subscription::new().channels(["chat"]))
        .unwrap();
    manager
        .wait_for(|s| s == SubscribeState::HandshakeFailed)
        .await
        .unwrap();

    let statuses = recorder.statuses.lock().unwrap().clone();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].category, StatusCategory::Disconnected);
    assert!(matches!(
        statuses[0].error,
        Some(EngineError::EffectPanicked { effect: "handshake_reconnect", .. })
    ));
    manager.shutdown().await;
}
