use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::seating::{AssignmentRecord, Seat};

/// Persistence collaborator for seats and assignment records.
///
/// Treated as strongly consistent for the duration of one `assign` call.
#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// All seats in stable roster order.
    async fn list_seats(&self) -> Result<Vec<Seat>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_assignments(
        &self,
    ) -> Result<Vec<AssignmentRecord>, Box<dyn std::error::Error + Send + Sync>>;

    async fn append_assignment(
        &self,
        record: &AssignmentRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Bulk insert used by the layout importer.
    async fn insert_seats(
        &self,
        seats: &[Seat],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Requester already has a seat: {0}")]
    DuplicateRequester(String),

    #[error("Seat already assigned: {0}")]
    DuplicateSeat(String),

    #[error("Seat id already exists: {0}")]
    DuplicateSeatId(String),
}

/// Repository kept entirely in memory. Used for demo rooms and tests; it
/// enforces the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct InMemorySeatRepository {
    seats: RwLock<Vec<Seat>>,
    assignments: RwLock<Vec<AssignmentRecord>>,
}

impl InMemorySeatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seats(seats: Vec<Seat>) -> Self {
        Self {
            seats: RwLock::new(seats),
            assignments: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SeatRepository for InMemorySeatRepository {
    async fn list_seats(&self) -> Result<Vec<Seat>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.seats.read().await.clone())
    }

    async fn list_assignments(
        &self,
    ) -> Result<Vec<AssignmentRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.assignments.read().await.clone())
    }

    async fn append_assignment(
        &self,
        record: &AssignmentRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut assignments = self.assignments.write().await;

        if assignments.iter().any(|r| r.requester_id == record.requester_id) {
            return Err(Box::new(RepositoryError::DuplicateRequester(record.requester_id.clone())));
        }
        if assignments.iter().any(|r| r.seat_id == record.seat_id) {
            return Err(Box::new(RepositoryError::DuplicateSeat(record.seat_id.clone())));
        }

        assignments.push(record.clone());
        Ok(())
    }

    async fn insert_seats(
        &self,
        seats: &[Seat],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut existing = self.seats.write().await;

        for seat in seats {
            if existing.iter().any(|s| s.id == seat.id) {
                return Err(Box::new(RepositoryError::DuplicateSeatId(seat.id.clone())));
            }
        }

        existing.extend(seats.iter().cloned().map(|mut s| {
            s.occupied = false;
            s
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_enforces_uniqueness() {
        let repo = InMemorySeatRepository::with_seats(vec![
            Seat::new("A0", 0.0, 0.0, 0.0),
            Seat::new("A1", 1.0, 0.0, 0.0),
        ]);

        repo.append_assignment(&AssignmentRecord::new("s1", "A0")).await.unwrap();

        let same_requester = repo.append_assignment(&AssignmentRecord::new("s1", "A1")).await;
        assert!(same_requester.is_err());

        let same_seat = repo.append_assignment(&AssignmentRecord::new("s2", "A0")).await;
        assert!(same_seat.is_err());

        assert_eq!(repo.list_assignments().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_seats_keeps_order_and_rejects_duplicates() {
        let repo = InMemorySeatRepository::new();
        repo.insert_seats(&[Seat::new("B", 0.0, 0.0, 0.0), Seat::new("A", 1.0, 0.0, 0.0)])
            .await
            .unwrap();

        let ids: Vec<String> = repo.list_seats().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["B", "A"]);

        assert!(repo.insert_seats(&[Seat::new("A", 9.0, 9.0, 0.0)]).await.is_err());
    }
}
