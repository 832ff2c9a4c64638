pub mod seating;
pub mod repository;
pub mod assignment;
pub mod notifier;
pub mod service;
pub mod layout;
pub mod heatmap;

pub use assignment::{AssignOutcome, AssignmentError, AssignmentStore};
pub use notifier::{BroadcastReport, ChangeNotifier, NotifyError, Subscriber, SubscriberRegistry};
pub use repository::{InMemorySeatRepository, SeatRepository};
pub use service::{SeatRequestResult, SeatingService};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
