use std::sync::Arc;
use super::seat::Seat;
use super::visibility::exposure;
use crate::{CoreError, CoreResult};

/// Strategy for choosing the next seat from a materialized roster.
///
/// Returns the index of the chosen seat, or `None` when every seat is
/// occupied. Implementations must be pure over `seats`.
pub trait SeatPicker: Send + Sync {
    fn name(&self) -> &'static str;

    fn pick(&self, seats: &[Seat]) -> Option<usize>;
}

/// Highest exposure of `seats[index]` to any occupied seat. Zero when no
/// other seat is occupied.
pub fn worst_exposure(index: usize, seats: &[Seat]) -> f64 {
    let Some(candidate) = seats.get(index) else {
        return 0.0;
    };

    seats
        .iter()
        .enumerate()
        .filter(|(i, other)| *i != index && other.occupied)
        .map(|(_, occupant)| exposure(occupant, candidate))
        .fold(0.0, f64::max)
}

/// Index of the unoccupied seat with the lowest worst-case exposure. Ties
/// go to the seat that appears first.
pub fn select_least_visible(seats: &[Seat]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (index, seat) in seats.iter().enumerate() {
        if seat.occupied {
            continue;
        }

        let visibility = worst_exposure(index, seats);
        match best {
            Some((_, lowest)) if visibility >= lowest => {}
            _ => best = Some((index, visibility)),
        }
    }

    best.map(|(index, _)| index)
}

/// Greedy visibility-scored picker.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastExposure;

impl SeatPicker for LeastExposure {
    fn name(&self) -> &'static str {
        "least_exposure"
    }

    fn pick(&self, seats: &[Seat]) -> Option<usize> {
        select_least_visible(seats)
    }
}

/// Fills seats in roster order without scoring.
///
/// Rosters are stored row-major (front row first, left to right), so the
/// first free seat is also the first free seat of the frontmost row.
/// `row_width` only describes the layout; it never changes which seat is
/// picked.
#[derive(Debug, Clone, Copy)]
pub struct RowMajor {
    row_width: usize,
}

impl RowMajor {
    pub fn new(row_width: usize) -> CoreResult<Self> {
        if row_width == 0 {
            return Err(CoreError::ValidationError("row width must be at least 1".to_string()));
        }
        Ok(Self { row_width })
    }

    pub fn row_width(&self) -> usize {
        self.row_width
    }
}

impl SeatPicker for RowMajor {
    fn name(&self) -> &'static str {
        "row_major"
    }

    fn pick(&self, seats: &[Seat]) -> Option<usize> {
        seats.iter().position(|seat| !seat.occupied)
    }
}

/// Resolves a configured strategy name (`least_exposure` or `row_major`).
pub fn picker_for(strategy: &str, row_width: usize) -> CoreResult<Arc<dyn SeatPicker>> {
    match strategy {
        "least_exposure" => Ok(Arc::new(LeastExposure)),
        "row_major" => Ok(Arc::new(RowMajor::new(row_width)?)),
        other => Err(CoreError::ValidationError(format!("unknown seating strategy: {}", other))),
    }
}
