pub mod models;
pub mod pii;

pub use models::events::SeatAssignedEvent;
pub use pii::Masked;
