pub mod checkout;
pub mod confirmation;
pub mod lifecycle;
pub mod memory;

pub use checkout::{BookingRequest, Checkout, CheckoutError};
pub use confirmation::{AutoApprove, ConfirmationGateway, ConfirmationRequest, Decision};
pub use lifecycle::{BookingLifecycle, LifecycleError, Rejection, Transition};
pub use memory::InMemoryBackend;
