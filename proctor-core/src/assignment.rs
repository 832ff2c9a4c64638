use std::sync::Arc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use proctor_shared::Masked;
use crate::repository::SeatRepository;
use crate::seating::{AssignmentRecord, SeatPicker, SeatRoster};

/// Result of a seat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "seat_id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignOutcome {
    /// A new record was created for this requester.
    Assigned(String),
    /// The requester already had a seat; nothing was written.
    Existing(String),
    /// Every seat is taken. Not an error.
    NoSeats,
}

impl AssignOutcome {
    pub fn seat_id(&self) -> Option<&str> {
        match self {
            AssignOutcome::Assigned(id) | AssignOutcome::Existing(id) => Some(id),
            AssignOutcome::NoSeats => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("Requester id must not be empty")]
    EmptyRequester,

    #[error("Seat repository failed: {0}")]
    Repository(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Picker {picker} chose seat index {index} from a roster of {len}")]
    PickerOutOfRange {
        picker: &'static str,
        index: usize,
        len: usize,
    },
}

/// Maps requesters to seats, one seat per requester, never two requesters
/// per seat.
///
/// Every `assign` call runs its lookup, occupancy replay, pick and append
/// while holding `gate`, so no two calls interleave inside that sequence.
pub struct AssignmentStore {
    repo: Arc<dyn SeatRepository>,
    picker: Arc<dyn SeatPicker>,
    gate: Mutex<()>,
}

impl AssignmentStore {
    pub fn new(repo: Arc<dyn SeatRepository>, picker: Arc<dyn SeatPicker>) -> Self {
        Self {
            repo,
            picker,
            gate: Mutex::new(()),
        }
    }

    pub fn picker_name(&self) -> &'static str {
        self.picker.name()
    }

    pub async fn assign(&self, requester_id: &str) -> Result<AssignOutcome, AssignmentError> {
        if requester_id.trim().is_empty() {
            return Err(AssignmentError::EmptyRequester);
        }

        let _guard = self.gate.lock().await;

        let records = self.repo.list_assignments().await.map_err(AssignmentError::Repository)?;
        if let Some(existing) = records.iter().find(|r| r.requester_id == requester_id) {
            debug!("Requester {} already seated at {}", Masked(requester_id), existing.seat_id);
            return Ok(AssignOutcome::Existing(existing.seat_id.clone()));
        }

        let roster = self.materialize(&records).await?;

        let Some(index) = self.picker.pick(roster.seats()) else {
            info!("No seats left for requester {}", Masked(requester_id));
            return Ok(AssignOutcome::NoSeats);
        };
        let Some(seat) = roster.get(index) else {
            return Err(AssignmentError::PickerOutOfRange {
                picker: self.picker.name(),
                index,
                len: roster.len(),
            });
        };

        let record = AssignmentRecord::new(requester_id, seat.id.clone());
        if let Err(e) = self.repo.append_assignment(&record).await {
            // The gate is per process; a replica sharing the repository may
            // have seated this requester since the lookup above.
            let records = self.repo.list_assignments().await.map_err(AssignmentError::Repository)?;
            if let Some(existing) = records.iter().find(|r| r.requester_id == requester_id) {
                warn!(
                    "Requester {} was seated at {} by another writer",
                    Masked(requester_id),
                    existing.seat_id
                );
                return Ok(AssignOutcome::Existing(existing.seat_id.clone()));
            }
            return Err(AssignmentError::Repository(e));
        }

        info!(
            "Assigned seat {} to requester {} via {} ({} left)",
            record.seat_id,
            Masked(requester_id),
            self.picker.name(),
            roster.available().saturating_sub(1)
        );
        Ok(AssignOutcome::Assigned(record.seat_id))
    }

    /// Current roster with occupancy applied. Read-only snapshot.
    pub async fn roster(&self) -> Result<SeatRoster, AssignmentError> {
        let _guard = self.gate.lock().await;
        let records = self.repo.list_assignments().await.map_err(AssignmentError::Repository)?;
        self.materialize(&records).await
    }

    async fn materialize(&self, records: &[AssignmentRecord]) -> Result<SeatRoster, AssignmentError> {
        let seats = self.repo.list_seats().await.map_err(AssignmentError::Repository)?;
        let mut roster = SeatRoster::new(seats);

        let unknown = roster.apply_assignments(records);
        if !unknown.is_empty() {
            warn!("Ignoring assignments to unknown seats: {:?}", unknown);
        }

        Ok(roster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemorySeatRepository;
    use crate::seating::{LeastExposure, RowMajor, Seat};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::error::Error;

    fn store_with(seats: Vec<Seat>, picker: Arc<dyn SeatPicker>) -> (Arc<InMemorySeatRepository>, AssignmentStore) {
        let repo = Arc::new(InMemorySeatRepository::with_seats(seats));
        let store = AssignmentStore::new(repo.clone(), picker);
        (repo, store)
    }

    #[tokio::test]
    async fn test_two_seat_walkthrough() {
        let (repo, store) = store_with(
            vec![Seat::new("A", 0.0, 0.0, 0.0), Seat::new("B", 5.0, 5.0, 0.0)],
            Arc::new(LeastExposure),
        );

        assert_eq!(store.assign("s1").await.unwrap(), AssignOutcome::Assigned("A".into()));
        assert_eq!(store.assign("s2").await.unwrap(), AssignOutcome::Assigned("B".into()));
        assert_eq!(store.assign("s1").await.unwrap(), AssignOutcome::Existing("A".into()));
        assert_eq!(store.assign("s3").await.unwrap(), AssignOutcome::NoSeats);

        assert_eq!(repo.list_assignments().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_repeat_requests_are_idempotent() {
        let seats = (0..6).map(|i| Seat::new(format!("S{}", i), i as f64, 0.0, 0.0)).collect();
        let (repo, store) = store_with(seats, Arc::new(LeastExposure));

        let first = store.assign("examinee").await.unwrap();
        for _ in 0..5 {
            let again = store.assign("examinee").await.unwrap();
            assert_eq!(again.seat_id(), first.seat_id());
        }
        assert_eq!(repo.list_assignments().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_seats_creates_no_record() {
        let (repo, store) = store_with(vec![], Arc::new(LeastExposure));
        assert_eq!(store.assign("late").await.unwrap(), AssignOutcome::NoSeats);
        assert!(repo.list_assignments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_requester_rejected() {
        let (_, store) = store_with(vec![Seat::new("A", 0.0, 0.0, 0.0)], Arc::new(LeastExposure));
        assert!(matches!(store.assign("  ").await, Err(AssignmentError::EmptyRequester)));
    }

    #[tokio::test]
    async fn test_row_major_strategy_shares_store_contract() {
        let seats = (0..4).map(|i| Seat::new(format!("S{}", i), i as f64, 0.0, 0.0)).collect();
        let (_, store) = store_with(seats, Arc::new(RowMajor::new(2).unwrap()));

        assert_eq!(store.picker_name(), "row_major");
        assert_eq!(store.assign("a").await.unwrap(), AssignOutcome::Assigned("S0".into()));
        assert_eq!(store.assign("b").await.unwrap(), AssignOutcome::Assigned("S1".into()));
        assert_eq!(store.assign("a").await.unwrap(), AssignOutcome::Existing("S0".into()));
        assert_eq!(store.assign("c").await.unwrap(), AssignOutcome::Assigned("S2".into()));
    }

    #[tokio::test]
    async fn test_roster_reflects_assignments() {
        let (_, store) = store_with(
            vec![Seat::new("A", 0.0, 0.0, 0.0), Seat::new("B", 5.0, 5.0, 0.0)],
            Arc::new(LeastExposure),
        );
        store.assign("s1").await.unwrap();

        let roster = store.roster().await.unwrap();
        assert!(roster.seats()[0].occupied);
        assert!(!roster.seats()[1].occupied);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_requests_never_share_a_seat() {
        let seat_count = 24;
        let requesters = 100;
        let seats = (0..seat_count)
            .map(|i| Seat::new(format!("S{}", i), (i % 6) as f64, (i / 6) as f64, 0.0))
            .collect();
        let (repo, store) = store_with(seats, Arc::new(LeastExposure));
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for n in 0..requesters {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.assign(&format!("examinee-{}", n)).await }));
        }

        let mut seated = Vec::new();
        let mut turned_away = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                AssignOutcome::Assigned(seat) => seated.push(seat),
                AssignOutcome::NoSeats => turned_away += 1,
                AssignOutcome::Existing(_) => panic!("distinct requesters cannot hit existing records"),
            }
        }

        let distinct: HashSet<&String> = seated.iter().collect();
        assert_eq!(seated.len(), seat_count);
        assert_eq!(distinct.len(), seat_count);
        assert_eq!(turned_away, requesters - seat_count);
        assert_eq!(repo.list_assignments().await.unwrap().len(), seat_count);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_requester_converges() {
        let seats = (0..5).map(|i| Seat::new(format!("S{}", i), i as f64, 0.0, 0.0)).collect();
        let (repo, store) = store_with(seats, Arc::new(LeastExposure));
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.assign("same-person").await }));
        }

        let mut seats_seen = HashSet::new();
        let mut created = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            if matches!(outcome, AssignOutcome::Assigned(_)) {
                created += 1;
            }
            seats_seen.insert(outcome.seat_id().map(str::to_string));
        }

        assert_eq!(created, 1);
        assert_eq!(seats_seen.len(), 1);
        assert_eq!(repo.list_assignments().await.unwrap().len(), 1);
    }

    struct OffByOne;

    impl SeatPicker for OffByOne {
        fn name(&self) -> &'static str {
            "off_by_one"
        }

        fn pick(&self, seats: &[Seat]) -> Option<usize> {
            Some(seats.len())
        }
    }

    #[tokio::test]
    async fn test_out_of_range_pick_is_an_error() {
        let (repo, store) = store_with(vec![Seat::new("A", 0.0, 0.0, 0.0)], Arc::new(OffByOne));

        let err = store.assign("s1").await.unwrap_err();
        assert!(matches!(
            err,
            AssignmentError::PickerOutOfRange { picker: "off_by_one", index: 1, len: 1 }
        ));
        assert!(repo.list_assignments().await.unwrap().is_empty());
    }

    /// Shares its records with a second writer that seats the requester
    /// between our lookup and our append.
    struct ContendedRepository {
        inner: InMemorySeatRepository,
        rival_seat: String,
    }

    #[async_trait]
    impl SeatRepository for ContendedRepository {
        async fn list_seats(&self) -> Result<Vec<Seat>, Box<dyn Error + Send + Sync>> {
            self.inner.list_seats().await
        }

        async fn list_assignments(&self) -> Result<Vec<AssignmentRecord>, Box<dyn Error + Send + Sync>> {
            self.inner.list_assignments().await
        }

        async fn append_assignment(&self, record: &AssignmentRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
            let rival = AssignmentRecord::new(record.requester_id.clone(), self.rival_seat.clone());
            self.inner.append_assignment(&rival).await?;
            self.inner.append_assignment(record).await
        }

        async fn insert_seats(&self, seats: &[Seat]) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.inner.insert_seats(seats).await
        }
    }

    #[tokio::test]
    async fn test_duplicate_requester_from_other_writer_converges() {
        let repo = Arc::new(ContendedRepository {
            inner: InMemorySeatRepository::with_seats(vec![
                Seat::new("A", 0.0, 0.0, 0.0),
                Seat::new("B", 5.0, 5.0, 0.0),
            ]),
            rival_seat: "B".to_string(),
        });
        let store = AssignmentStore::new(repo.clone(), Arc::new(LeastExposure));

        assert_eq!(store.assign("s1").await.unwrap(), AssignOutcome::Existing("B".into()));
        let records = repo.list_assignments().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].seat_id, "B");
    }
}
