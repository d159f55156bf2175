use async_trait::async_trait;
use uuid::Uuid;
use voyage_catalog::{Promotion, Service, ServiceRef, ServiceStatus};

use crate::booking::{Booking, BookingStatus, NewBooking, PaymentStatus};
use crate::query::{BookingFilter, BookingPage, BookingStats, DeleteServiceOutcome};
use crate::BackendResult;

/// Booking endpoints of the backend
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn list_bookings(&self, filter: &BookingFilter) -> BackendResult<BookingPage>;

    async fn get_booking(&self, id: Uuid) -> BackendResult<Booking>;

    async fn create_booking(&self, booking: &NewBooking) -> BackendResult<Booking>;

    /// Write only `status`. `expected_version` rejects stale writes when set.
    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        expected_version: Option<u64>,
    ) -> BackendResult<()>;

    /// Write only `payment_status`
    async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
        expected_version: Option<u64>,
    ) -> BackendResult<()>;

    async fn delete_booking(&self, id: Uuid) -> BackendResult<()>;

    async fn fetch_stats(&self) -> BackendResult<BookingStats>;
}

/// Service management endpoints of the backend
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn get_service(&self, service: &ServiceRef) -> BackendResult<Service>;

    async fn set_service_status(&self, service: &ServiceRef, status: ServiceStatus) -> BackendResult<()>;

    /// Deletes the service and its dependent records, unless future active
    /// bookings still reference it
    async fn delete_service(&self, service: &ServiceRef) -> BackendResult<DeleteServiceOutcome>;
}

#[async_trait]
pub trait PromotionRepository: Send + Sync {
    async fn list_promotions(&self) -> BackendResult<Vec<Promotion>>;
}
