use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A physical seat. Geometry never changes after import; `occupied` is
/// only ever set while materializing occupancy for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// Facing direction in radians.
    pub angle: f64,
    #[serde(default)]
    pub occupied: bool,
}

impl Seat {
    pub fn new(id: impl Into<String>, x: f64, y: f64, angle: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            angle,
            occupied: false,
        }
    }

    pub fn occupied(mut self) -> Self {
        self.occupied = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub requester_id: String,
    pub seat_id: String,
}

impl AssignmentRecord {
    pub fn new(requester_id: impl Into<String>, seat_id: impl Into<String>) -> Self {
        Self {
            requester_id: requester_id.into(),
            seat_id: seat_id.into(),
        }
    }
}

/// Ordered seats for one session. Order is preserved as loaded, so tie
/// breaks between equally exposed seats are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeatRoster {
    seats: Vec<Seat>,
}

impl SeatRoster {
    pub fn new(seats: Vec<Seat>) -> Self {
        Self { seats }
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn get(&self, index: usize) -> Option<&Seat> {
        self.seats.get(index)
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn available(&self) -> usize {
        self.seats.iter().filter(|s| !s.occupied).count()
    }

    /// Replays assignment records onto the roster, marking each referenced
    /// seat occupied. Returns the seat ids referenced by a record that are
    /// not part of this roster.
    pub fn apply_assignments(&mut self, records: &[AssignmentRecord]) -> Vec<String> {
        let taken: HashSet<&str> = records.iter().map(|r| r.seat_id.as_str()).collect();

        for seat in self.seats.iter_mut() {
            if taken.contains(seat.id.as_str()) {
                seat.occupied = true;
            }
        }

        let known: HashSet<&str> = self.seats.iter().map(|s| s.id.as_str()).collect();
        records
            .iter()
            .filter(|r| !known.contains(r.seat_id.as_str()))
            .map(|r| r.seat_id.clone())
            .collect()
    }

    pub fn into_seats(self) -> Vec<Seat> {
        self.seats
    }
}

impl From<Vec<Seat>> for SeatRoster {
    fn from(seats: Vec<Seat>) -> Self {
        Self::new(seats)
    }
}
