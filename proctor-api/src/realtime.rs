use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use async_trait::async_trait;
use futures_util::Stream;
use proctor_core::notifier::{NotifyError, Subscriber, SubscriberRegistry};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use uuid::Uuid;

/// One frame queued for an SSE client.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeMessage {
    pub topic: String,
    pub payload: String,
}

/// Payload fields never sent to stream clients. The stream is public, so
/// who sits where stays with the Kafka relay and the database.
const PRIVATE_FIELDS: &[&str] = &["requester_id"];

/// Strips `PRIVATE_FIELDS` from JSON object payloads. Anything else is
/// forwarded unchanged.
pub fn public_payload(payload: &str) -> String {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(mut fields)) => {
            for field in PRIVATE_FIELDS {
                fields.remove(*field);
            }
            Value::Object(fields).to_string()
        }
        _ => payload.to_string(),
    }
}

/// A connected SSE client. Sends never wait: a client whose buffer is full
/// misses the frame and the send is reported as failed.
pub struct StreamClient {
    id: String,
    topics: HashSet<String>,
    tx: mpsc::Sender<RealtimeMessage>,
}

impl StreamClient {
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[async_trait]
impl Subscriber for StreamClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn wants(&self, topic: &str) -> bool {
        self.topics.contains(topic)
    }

    async fn send(&self, topic: &str, payload: &str) -> Result<(), NotifyError> {
        let message = RealtimeMessage {
            topic: topic.to_string(),
            payload: public_payload(payload),
        };

        match self.tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Closed(_)) => Err(NotifyError::Disconnected(self.id.clone())),
            Err(TrySendError::Full(_)) => Err(NotifyError::Delivery {
                subscriber: self.id.clone(),
                reason: "client buffer full".to_string(),
            }),
        }
    }
}

/// Registry of live SSE clients plus permanently attached sinks.
pub struct RealtimeHub {
    clients: RwLock<HashMap<String, Arc<StreamClient>>>,
    sinks: RwLock<Vec<Arc<dyn Subscriber>>>,
    buffer: usize,
}

impl RealtimeHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            sinks: RwLock::new(Vec::new()),
            buffer: buffer.max(1),
        }
    }

    /// Adds a subscriber that stays registered for the hub's lifetime.
    pub async fn attach(&self, sink: Arc<dyn Subscriber>) {
        info!("Attached realtime sink {}", sink.id());
        self.sinks.write().await.push(sink);
    }

    pub async fn connect(&self, topics: Vec<String>) -> (String, mpsc::Receiver<RealtimeMessage>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = format!("sse-{}", Uuid::new_v4());

        let client = Arc::new(StreamClient {
            id: id.clone(),
            topics: topics.into_iter().collect(),
            tx,
        });
        self.clients.write().await.insert(id.clone(), client);

        debug!("Realtime client {} connected", id);
        (id, rx)
    }

    /// Like `connect`, but the returned stream unregisters the client when
    /// it is dropped.
    pub async fn subscribe(self: &Arc<Self>, topics: Vec<String>) -> ClientStream {
        let (id, rx) = self.connect(topics).await;
        ClientStream {
            id,
            hub: self.clone(),
            inner: ReceiverStream::new(rx),
        }
    }

    pub async fn disconnect(&self, id: &str) -> bool {
        self.clients.write().await.remove(id).is_some()
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    async fn prune_disconnected(&self) {
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|_, client| client.is_connected());
        let pruned = before - clients.len();
        if pruned > 0 {
            debug!("Pruned {} disconnected realtime clients", pruned);
        }
    }
}

/// Frames for one SSE client.
pub struct ClientStream {
    id: String,
    hub: Arc<RealtimeHub>,
    inner: ReceiverStream<RealtimeMessage>,
}

impl ClientStream {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Stream for ClientStream {
    type Item = RealtimeMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for ClientStream {
    fn drop(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let hub = self.hub.clone();
        let id = std::mem::take(&mut self.id);
        runtime.spawn(async move {
            if hub.disconnect(&id).await {
                debug!("Realtime client {} disconnected", id);
            }
        });
    }
}

#[async_trait]
impl SubscriberRegistry for RealtimeHub {
    async fn subscribers(&self) -> Vec<Arc<dyn Subscriber>> {
        self.prune_disconnected().await;

        let mut all: Vec<Arc<dyn Subscriber>> = self.sinks.read().await.clone();
        all.extend(
            self.clients
                .read()
                .await
                .values()
                .map(|client| client.clone() as Arc<dyn Subscriber>),
        );
        all
    }
}
