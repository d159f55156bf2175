pub mod booking;
pub mod clock;
pub mod query;
pub mod repository;

pub use booking::{count_future_active, Booking, BookingStatus, NewBooking, PaymentStatus, TransitionPolicy};
pub use clock::{Clock, FixedClock, SystemClock};
pub use query::{BookingFilter, BookingPage, BookingStats, DeleteServiceOutcome, Pagination};
pub use repository::{BookingRepository, PromotionRepository, ServiceRepository};

use uuid::Uuid;

/// Anything that went wrong talking to the backend. Callers treat these as
/// "the operation did not complete"; no local state was changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Transport(String),
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Could not decode backend response: {0}")]
    Decode(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Booking {0} was modified concurrently")]
    StaleWrite(Uuid),
}

pub type BackendResult<T> = Result<T, BackendError>;
