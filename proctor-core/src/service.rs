use std::sync::Arc;
use tracing::{info, warn};
use proctor_shared::{Masked, SeatAssignedEvent};
use crate::assignment::{AssignOutcome, AssignmentError, AssignmentStore};
use crate::notifier::{BroadcastReport, ChangeNotifier, NotifyError, SubscriberRegistry};
use crate::seating::SeatRoster;

/// What a caller gets back from a seat request.
#[derive(Debug)]
pub struct SeatRequestResult {
    pub outcome: AssignOutcome,
    /// Set only when a new assignment was broadcast.
    pub notification: Option<Result<BroadcastReport, NotifyError>>,
}

/// Ties the assignment store to the change notifier: every newly created
/// assignment is broadcast to the registry's subscribers.
pub struct SeatingService {
    store: AssignmentStore,
    notifier: ChangeNotifier,
    registry: Arc<dyn SubscriberRegistry>,
    topic: String,
}

impl SeatingService {
    pub fn new(
        store: AssignmentStore,
        notifier: ChangeNotifier,
        registry: Arc<dyn SubscriberRegistry>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            registry,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }

    /// Assigns (or recalls) the requester's seat. A failed broadcast is
    /// reported in the result but never undoes the assignment.
    pub async fn request_seat(&self, requester_id: &str) -> Result<SeatRequestResult, AssignmentError> {
        let outcome = self.store.assign(requester_id).await?;

        let seat_id = match outcome {
            AssignOutcome::Assigned(seat_id) => seat_id,
            other => {
                return Ok(SeatRequestResult {
                    outcome: other,
                    notification: None,
                })
            }
        };

        let event = SeatAssignedEvent::new(requester_id, seat_id.clone());
        let notification = match event.to_payload() {
            Ok(payload) => self.announce(seat_id.clone(), requester_id.to_string(), payload).await,
            Err(e) => {
                warn!("Could not serialize assignment event for seat {}: {}", seat_id, e);
                Err(NotifyError::Delivery {
                    subscriber: "*".to_string(),
                    reason: e.to_string(),
                })
            }
        };

        Ok(SeatRequestResult {
            outcome: AssignOutcome::Assigned(seat_id),
            notification: Some(notification),
        })
    }

    pub async fn roster(&self) -> Result<SeatRoster, AssignmentError> {
        self.store.roster().await
    }

    /// Broadcasts on a detached task. The record is already written, so the
    /// announcement must finish even if the caller's future is dropped.
    async fn announce(
        &self,
        seat_id: String,
        requester_id: String,
        payload: String,
    ) -> Result<BroadcastReport, NotifyError> {
        let notifier = self.notifier.clone();
        let registry = self.registry.clone();
        let topic = self.topic.clone();

        let task = tokio::spawn(async move {
            let subscribers = registry.subscribers().await;
            let result = notifier.broadcast(&topic, &payload, subscribers).await;
            match &result {
                Ok(report) => info!(
                    "Seat {} for {} announced to {} subscribers",
                    seat_id,
                    Masked(&requester_id),
                    report.delivered
                ),
                Err(e) => warn!("Seat {} announcement incomplete: {}", seat_id, e),
            }
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(NotifyError::Delivery {
                subscriber: "*".to_string(),
                reason: format!("announcement task failed: {}", e),
            }),
        }
    }
}
