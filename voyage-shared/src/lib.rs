pub mod money;
pub mod passengers;
pub mod pii;

pub use money::{Money, MoneyError};
pub use passengers::{Passenger, PassengerComposition, PassengerType};
pub use pii::Masked;
