use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use voyage_catalog::{ServiceRef, ServiceType};
use voyage_shared::{Masked, Money, Passenger};

/// Fulfillment lifecycle of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// pending → confirmed → completed, cancelled from pending or confirmed
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment lifecycle of a booking, independent of [`BookingStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

impl PaymentStatus {
    /// pending → paid → refunded; pending → failed; failed → paid on retry
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Failed) | (Failed, Paid) | (Paid, Refunded)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == PaymentStatus::Refunded
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strictly status changes are checked.
///
/// `Permissive` reproduces the legacy admin console, where any status could
/// be set to any other; the unchanged-value guard still applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    #[default]
    Strict,
    Permissive,
}

impl TransitionPolicy {
    pub fn allows_status(self, from: BookingStatus, to: BookingStatus) -> bool {
        self == TransitionPolicy::Permissive || from.can_transition_to(to)
    }

    pub fn allows_payment(self, from: PaymentStatus, to: PaymentStatus) -> bool {
        self == TransitionPolicy::Permissive || from.can_transition_to(to)
    }
}

/// A customer's purchase of one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub service_type: ServiceType,
    pub service_id: Uuid,
    pub user_id: Option<Uuid>,
    pub booking_date: DateTime<Utc>,
    /// Day the service is consumed: departure, check-in or pick-up
    pub service_date: NaiveDate,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_price: Money,
    pub contact_email: Masked<String>,
    pub contact_phone: Masked<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub passengers: Vec<Passenger>,
    pub applied_promotion_id: Option<Uuid>,
    /// Concurrency token; bumped by the backend on every write
    #[serde(default)]
    pub version: u64,
}

impl Booking {
    pub fn service_ref(&self) -> ServiceRef {
        ServiceRef::new(self.service_type, self.service_id)
    }

    /// Dated today or later and not cancelled. Such a booking pins its service.
    pub fn is_future_active(&self, today: NaiveDate) -> bool {
        self.service_date >= today && self.status != BookingStatus::Cancelled
    }
}

/// Number of bookings that block deleting `service`
pub fn count_future_active<'a>(
    bookings: impl IntoIterator<Item = &'a Booking>,
    service: &ServiceRef,
    today: NaiveDate,
) -> usize {
    bookings
        .into_iter()
        .filter(|b| b.service_ref() == *service && b.is_future_active(today))
        .count()
}

/// Body of `POST /bookings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub service_type: ServiceType,
    pub service_id: Uuid,
    pub user_id: Option<Uuid>,
    pub service_date: NaiveDate,
    pub total_price: Money,
    pub contact_email: Masked<String>,
    pub contact_phone: Masked<String>,
    pub notes: Option<String>,
    pub passengers: Vec<Passenger>,
    pub applied_promotion_id: Option<Uuid>,
}

impl NewBooking {
    /// Materialise the booking the way the backend does on creation
    pub fn into_booking(self, booking_date: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            service_type: self.service_type,
            service_id: self.service_id,
            user_id: self.user_id,
            booking_date,
            service_date: self.service_date,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_price: self.total_price,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            notes: self.notes,
            passengers: self.passengers,
            applied_promotion_id: self.applied_promotion_id,
            version: 0,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn booking(service: ServiceRef, service_date: NaiveDate, status: BookingStatus) -> Booking {
        let mut booking = NewBooking {
            service_type: service.service_type,
            service_id: service.id,
            user_id: None,
            service_date,
            total_price: Money::vnd(1_000_000),
            contact_email: Masked::from("guest@example.com"),
            contact_phone: Masked::from("0901234567"),
            notes: None,
            passengers: Vec::new(),
            applied_promotion_id: None,
        }
        .into_booking(Utc::now());
        booking.status = status;
        booking
    }
}
