use std::fmt;
use std::sync::Arc;
use uuid::Uuid;
use voyage_catalog::{ServiceRef, ServiceStatus};
use voyage_core::{
    BackendError, Booking, BookingRepository, BookingStatus, DeleteServiceOutcome, PaymentStatus,
    ServiceRepository, TransitionPolicy,
};

use crate::confirmation::{ConfirmationGateway, ConfirmationRequest, Decision};

/// Why a requested change was not applied. Nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("the new value equals the current one")]
    NoChange,

    #[error("invalid state transition: {0}")]
    IllegalTransition(Transition),

    #[error("the operator did not confirm")]
    NotConfirmed,
}

/// A move on one of the two booking state machines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Status { from: BookingStatus, to: BookingStatus },
    Payment { from: PaymentStatus, to: PaymentStatus },
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Status { from, to } => write!(f, "status {} to {}", from, to),
            Transition::Payment { from, to } => write!(f, "payment {} to {}", from, to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Change rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("{service} has {future_bookings_count} future booking(s); deactivate it instead")]
    HasFutureBookings {
        service: ServiceRef,
        future_bookings_count: u32,
    },

    /// The write went through; only reloading the booking failed
    #[error("Booking {booking_id} was updated but could not be reloaded: {error}")]
    CommittedRefetchFailed {
        booking_id: Uuid,
        #[source]
        error: BackendError,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl LifecycleError {
    /// True when the backend holds the requested change despite the error
    pub fn is_committed(&self) -> bool {
        matches!(self, LifecycleError::CommittedRefetchFailed { .. })
    }
}

/// Owns the booking status and payment state machines and the service
/// delete-or-deactivate rule.
///
/// Every mutation goes: guard checks, operator confirmation, one backend
/// write, re-fetch. A failure before the write leaves the backend untouched;
/// a failed re-fetch surfaces as [`LifecycleError::CommittedRefetchFailed`].
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingRepository>,
    services: Arc<dyn ServiceRepository>,
    gateway: Arc<dyn ConfirmationGateway>,
    policy: TransitionPolicy,
}

impl BookingLifecycle {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        services: Arc<dyn ServiceRepository>,
        gateway: Arc<dyn ConfirmationGateway>,
    ) -> Self {
        Self {
            bookings,
            services,
            gateway,
            policy: TransitionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Change the fulfillment status. `payment_status` is never touched.
    pub async fn update_status(&self, booking: &Booking, new_status: BookingStatus) -> Result<Booking, LifecycleError> {
        let from = booking.status;
        if from == new_status {
            return Err(Rejection::NoChange.into());
        }
        if !self.policy.allows_status(from, new_status) {
            return Err(Rejection::IllegalTransition(Transition::Status { from, to: new_status }).into());
        }

        self.confirm(ConfirmationRequest::ChangeStatus {
            booking_id: booking.id,
            from,
            to: new_status,
        })
        .await?;

        self.bookings
            .update_status(booking.id, new_status, Some(booking.version))
            .await?;
        tracing::info!(booking_id = %booking.id, %from, to = %new_status, "Booking status updated");

        self.refetch(booking.id).await
    }

    /// Change the payment status. `status` is never touched.
    pub async fn update_payment_status(
        &self,
        booking: &Booking,
        new_payment_status: PaymentStatus,
    ) -> Result<Booking, LifecycleError> {
        let from = booking.payment_status;
        if from == new_payment_status {
            return Err(Rejection::NoChange.into());
        }
        if !self.policy.allows_payment(from, new_payment_status) {
            return Err(Rejection::IllegalTransition(Transition::Payment {
                from,
                to: new_payment_status,
            })
            .into());
        }

        self.confirm(ConfirmationRequest::ChangePaymentStatus {
            booking_id: booking.id,
            from,
            to: new_payment_status,
        })
        .await?;

        self.bookings
            .update_payment_status(booking.id, new_payment_status, Some(booking.version))
            .await?;
        tracing::info!(booking_id = %booking.id, %from, to = %new_payment_status, "Payment status updated");

        self.refetch(booking.id).await
    }

    /// Hard delete. Bookings have no dependents, so there is no guard.
    pub async fn delete_booking(&self, booking_id: Uuid) -> Result<(), LifecycleError> {
        self.confirm(ConfirmationRequest::DeleteBooking { booking_id }).await?;
        self.bookings.delete_booking(booking_id).await?;
        tracing::warn!(%booking_id, "Booking deleted");
        Ok(())
    }

    /// Delete a service unless future active bookings still reference it.
    /// On [`LifecycleError::HasFutureBookings`] offer [`Self::deactivate_service`].
    pub async fn delete_service(&self, service: &ServiceRef) -> Result<(), LifecycleError> {
        self.confirm(ConfirmationRequest::DeleteService { service: *service }).await?;

        match self.services.delete_service(service).await? {
            DeleteServiceOutcome::Deleted => {
                tracing::warn!(%service, "Service deleted");
                Ok(())
            }
            DeleteServiceOutcome::HasFutureBookings { future_bookings_count } => {
                tracing::info!(%service, future_bookings_count, "Service delete blocked by future bookings");
                Err(LifecycleError::HasFutureBookings {
                    service: *service,
                    future_bookings_count,
                })
            }
        }
    }

    pub async fn set_service_status(&self, service: &ServiceRef, status: ServiceStatus) -> Result<(), LifecycleError> {
        let current = self.services.get_service(service).await?;
        if current.status == status {
            return Err(Rejection::NoChange.into());
        }

        self.confirm(ConfirmationRequest::ChangeServiceStatus {
            service: *service,
            from: current.status,
            to: status,
        })
        .await?;

        self.services.set_service_status(service, status).await?;
        tracing::info!(%service, from = ?current.status, to = ?status, "Service status updated");
        Ok(())
    }

    /// Fallback when [`Self::delete_service`] is blocked
    pub async fn deactivate_service(&self, service: &ServiceRef) -> Result<(), LifecycleError> {
        self.set_service_status(service, ServiceStatus::Inactive).await
    }

    async fn refetch(&self, booking_id: Uuid) -> Result<Booking, LifecycleError> {
        self.bookings.get_booking(booking_id).await.map_err(|error| {
            tracing::warn!(%booking_id, %error, "Booking updated but reload failed");
            LifecycleError::CommittedRefetchFailed { booking_id, error }
        })
    }

    async fn confirm(&self, request: ConfirmationRequest) -> Result<(), LifecycleError> {
        match self.gateway.confirm(&request).await {
            Decision::Approved => Ok(()),
            Decision::Declined => {
                tracing::debug!(prompt = %request.prompt(), "Confirmation declined");
                Err(Rejection::NotConfirmed.into())
            }
        }
    }
}
