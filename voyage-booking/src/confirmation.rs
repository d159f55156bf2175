use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;
use voyage_catalog::{ServiceRef, ServiceStatus};
use voyage_core::{BookingStatus, PaymentStatus};

/// A mutation waiting for an operator's go-ahead. Every admin screen hands
/// one of these to the same [`ConfirmationGateway`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ConfirmationRequest {
    ChangeStatus {
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    },
    ChangePaymentStatus {
        booking_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    },
    DeleteBooking {
        booking_id: Uuid,
    },
    ChangeServiceStatus {
        service: ServiceRef,
        from: ServiceStatus,
        to: ServiceStatus,
    },
    DeleteService {
        service: ServiceRef,
    },
}

impl ConfirmationRequest {
    /// Text for the confirm dialog
    pub fn prompt(&self) -> String {
        match self {
            ConfirmationRequest::ChangeStatus { booking_id, from, to } => {
                format!("Change booking {booking_id} status from {from} to {to}?")
            }
            ConfirmationRequest::ChangePaymentStatus { booking_id, from, to } => {
                format!("Change booking {booking_id} payment from {from} to {to}?")
            }
            ConfirmationRequest::DeleteBooking { booking_id } => {
                format!("Permanently delete booking {booking_id}? This cannot be undone.")
            }
            ConfirmationRequest::ChangeServiceStatus { service, from, to } => {
                format!("Change {service} from {from:?} to {to:?}?")
            }
            ConfirmationRequest::DeleteService { service } => {
                format!("Delete {service} and its schedules?")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Declined,
}

#[async_trait]
pub trait ConfirmationGateway: Send + Sync {
    async fn confirm(&self, request: &ConfirmationRequest) -> Decision;
}

/// Approves everything. For scripted maintenance where the caller already
/// decided.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ConfirmationGateway for AutoApprove {
    async fn confirm(&self, _request: &ConfirmationRequest) -> Decision {
        Decision::Approved
    }
}
