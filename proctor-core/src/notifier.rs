use std::sync::Arc;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub const DEFAULT_CHUNK_SIZE: usize = 300;

/// One observer of assignment changes (an SSE client, a Kafka relay...).
#[async_trait]
pub trait Subscriber: Send + Sync {
    fn id(&self) -> &str;

    fn wants(&self, topic: &str) -> bool;

    async fn send(&self, topic: &str, payload: &str) -> Result<(), NotifyError>;
}

/// Source of the current subscriber set.
#[async_trait]
pub trait SubscriberRegistry: Send + Sync {
    async fn subscribers(&self) -> Vec<Arc<dyn Subscriber>>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("Subscriber {0} is disconnected")]
    Disconnected(String),

    #[error("Delivery to {subscriber} failed: {reason}")]
    Delivery { subscriber: String, reason: String },

    #[error("Notification worker for chunk {chunk} failed: {reason}")]
    Worker { chunk: usize, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub chunks: usize,
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Default)]
struct ChunkOutcome {
    delivered: usize,
    skipped: usize,
    failed: usize,
    first_error: Option<NotifyError>,
}

/// Fans a payload out to subscribers, one task per chunk.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    chunk_size: usize,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChangeNotifier {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Sends `payload` to every subscriber that wants `topic`.
    ///
    /// All chunks run to completion. If any send failed, the first failure
    /// in chunk order is returned; deliveries that already happened stand.
    pub async fn broadcast(
        &self,
        topic: &str,
        payload: &str,
        subscribers: Vec<Arc<dyn Subscriber>>,
    ) -> Result<BroadcastReport, NotifyError> {
        let topic: Arc<str> = Arc::from(topic);
        let payload: Arc<str> = Arc::from(payload);

        let workers: Vec<JoinHandle<ChunkOutcome>> = subscribers
            .chunks(self.chunk_size)
            .map(|chunk| {
                let chunk = chunk.to_vec();
                let topic = topic.clone();
                let payload = payload.clone();
                tokio::spawn(async move { deliver_chunk(&topic, &payload, chunk).await })
            })
            .collect();

        let mut report = BroadcastReport {
            chunks: workers.len(),
            ..Default::default()
        };
        let mut first_error = None;

        for (index, worker) in workers.into_iter().enumerate() {
            match worker.await {
                Ok(outcome) => {
                    report.delivered += outcome.delivered;
                    report.skipped += outcome.skipped;
                    report.failed += outcome.failed;
                    if first_error.is_none() {
                        first_error = outcome.first_error;
                    }
                }
                Err(e) => {
                    error!("Notification worker {} on {} crashed: {}", index, topic, e);
                    if first_error.is_none() {
                        first_error = Some(NotifyError::Worker {
                            chunk: index,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        debug!(
            "Broadcast on {}: {} chunks, {} delivered, {} skipped, {} failed",
            topic, report.chunks, report.delivered, report.skipped, report.failed
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}

async fn deliver_chunk(topic: &str, payload: &str, chunk: Vec<Arc<dyn Subscriber>>) -> ChunkOutcome {
    let mut outcome = ChunkOutcome::default();

    for subscriber in chunk {
        if !subscriber.wants(topic) {
            outcome.skipped += 1;
            continue;
        }

        match subscriber.send(topic, payload).await {
            Ok(()) => outcome.delivered += 1,
            Err(e) => {
                warn!("Failed to notify {}: {}", subscriber.id(), e);
                outcome.failed += 1;
                outcome.first_error.get_or_insert(e);
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Probe {
        id: String,
        topics: Vec<String>,
        fail: bool,
        delay: Option<Duration>,
        hits: AtomicUsize,
    }

    impl Probe {
        fn new(id: usize, topic: &str) -> Arc<Self> {
            Arc::new(Self {
                id: format!("probe-{}", id),
                topics: vec![topic.to_string()],
                fail: false,
                delay: None,
                hits: AtomicUsize::new(0),
            })
        }

        fn failing(id: usize, topic: &str) -> Arc<Self> {
            Arc::new(Self {
                id: format!("broken-{}", id),
                topics: vec![topic.to_string()],
                fail: true,
                delay: None,
                hits: AtomicUsize::new(0),
            })
        }

        fn slow(id: usize, topic: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                id: format!("slow-{}", id),
                topics: vec![topic.to_string()],
                fail: false,
                delay: Some(delay),
                hits: AtomicUsize::new(0),
            })
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Subscriber for Probe {
        fn id(&self) -> &str {
            &self.id
        }

        fn wants(&self, topic: &str) -> bool {
            self.topics.iter().any(|t| t == topic)
        }

        async fn send(&self, _topic: &str, _payload: &str) -> Result<(), NotifyError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.hits.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NotifyError::Delivery {
                    subscriber: self.id.clone(),
                    reason: "socket closed".to_string(),
                });
            }
            Ok(())
        }
    }

    fn erase(probes: &[Arc<Probe>]) -> Vec<Arc<dyn Subscriber>> {
        probes.iter().map(|p| p.clone() as Arc<dyn Subscriber>).collect()
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber_once() {
        let probes: Vec<Arc<Probe>> = (0..301).map(|i| Probe::new(i, "seating.assignments")).collect();
        let notifier = ChangeNotifier::default();

        let report = notifier
            .broadcast("seating.assignments", "{}", erase(&probes))
            .await
            .unwrap();

        assert_eq!(report.chunks, 2);
        assert_eq!(report.delivered, 301);
        assert!(probes.iter().all(|p| p.hits() == 1));
    }

    #[tokio::test]
    async fn test_skips_other_topics() {
        let probes = vec![
            Probe::new(0, "seating.assignments"),
            Probe::new(1, "exam.schedule"),
            Probe::new(2, "seating.assignments"),
        ];

        let report = ChangeNotifier::new(2)
            .broadcast("seating.assignments", "{}", erase(&probes))
            .await
            .unwrap();

        assert_eq!(report.delivered, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(probes[1].hits(), 0);
    }

    #[tokio::test]
    async fn test_failure_reported_without_stopping_other_sends() {
        let topic = "seating.assignments";
        let probes = vec![
            Probe::new(0, topic),
            Probe::new(1, topic),
            Probe::failing(2, topic),
            Probe::new(3, topic),
            Probe::new(4, topic),
            Probe::failing(5, topic),
        ];

        let result = ChangeNotifier::new(2).broadcast(topic, "{}", erase(&probes)).await;

        match result {
            Err(NotifyError::Delivery { subscriber, .. }) => assert_eq!(subscriber, "broken-2"),
            other => panic!("expected delivery error, got {:?}", other),
        }
        assert!(probes.iter().all(|p| p.hits() == 1));
    }

    #[tokio::test]
    async fn test_empty_subscriber_set() {
        let report = ChangeNotifier::default()
            .broadcast("seating.assignments", "{}", Vec::new())
            .await
            .unwrap();
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_chunk_does_not_hold_up_others() {
        let topic = "seating.assignments";
        let probes: Vec<Arc<Probe>> = (0..4)
            .map(|i| Probe::slow(i, topic, Duration::from_secs(10)))
            .collect();

        let started = tokio::time::Instant::now();
        let report = ChangeNotifier::new(1).broadcast(topic, "{}", erase(&probes)).await.unwrap();

        assert_eq!(report.chunks, 4);
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[test]
    fn test_zero_chunk_size_clamped() {
        assert_eq!(ChangeNotifier::new(0).chunk_size(), 1);
    }
}
