use chrono::Utc;

/// Default topic assignment events are broadcast on.
pub const SEAT_ASSIGNED_TOPIC: &str = "seating.assignments";

/// Emitted once per newly created assignment. Idempotent repeats of an
/// existing assignment never produce one.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SeatAssignedEvent {
    pub requester_id: String,
    pub seat_id: String,
    pub assigned_at: i64,
}

impl SeatAssignedEvent {
    pub fn new(requester_id: impl Into<String>, seat_id: impl Into<String>) -> Self {
        Self {
            requester_id: requester_id.into(),
            seat_id: seat_id.into(),
            assigned_at: Utc::now().timestamp(),
        }
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
