pub mod seat;
pub mod visibility;
pub mod picker;

pub use seat::{AssignmentRecord, Seat, SeatRoster};
pub use visibility::exposure;
pub use picker::{picker_for, select_least_visible, worst_exposure, LeastExposure, RowMajor, SeatPicker};
