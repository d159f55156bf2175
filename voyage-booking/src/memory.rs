use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use voyage_catalog::{Promotion, Service, ServiceRef, ServiceStatus};
use voyage_core::{
    count_future_active, BackendError, BackendResult, Booking, BookingFilter, BookingPage,
    BookingRepository, BookingStats, BookingStatus, Clock, DeleteServiceOutcome, NewBooking,
    Pagination, PaymentStatus, PromotionRepository, ServiceRepository, SystemClock,
};

/// In-process stand-in for the backend. Applies the same rules the real
/// backend does: version checks on writes and the future-booking guard on
/// service deletion.
pub struct InMemoryBackend {
    bookings: RwLock<HashMap<Uuid, Booking>>,
    services: RwLock<HashMap<ServiceRef, Service>>,
    promotions: RwLock<Vec<Promotion>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryBackend {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            bookings: RwLock::new(HashMap::new()),
            services: RwLock::new(HashMap::new()),
            promotions: RwLock::new(Vec::new()),
            clock,
        }
    }

    pub async fn insert_service(&self, service: Service) {
        self.services.write().await.insert(service.service_ref(), service);
    }

    pub async fn insert_booking(&self, booking: Booking) {
        self.bookings.write().await.insert(booking.id, booking);
    }

    pub async fn insert_promotion(&self, promotion: Promotion) {
        self.promotions.write().await.push(promotion);
    }

    pub async fn contains_service(&self, service: &ServiceRef) -> bool {
        self.services.read().await.contains_key(service)
    }

    /// Apply `change` to one booking after the optional version check
    async fn write_booking(
        &self,
        id: Uuid,
        expected_version: Option<u64>,
        change: impl FnOnce(&mut Booking),
    ) -> BackendResult<()> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| BackendError::NotFound(format!("booking {id}")))?;

        if expected_version.is_some_and(|v| v != booking.version) {
            return Err(BackendError::StaleWrite(id));
        }

        change(booking);
        booking.version += 1;
        Ok(())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl BookingRepository for InMemoryBackend {
    async fn list_bookings(&self, filter: &BookingFilter) -> BackendResult<BookingPage> {
        let bookings = self.bookings.read().await;
        let mut matching: Vec<Booking> = bookings.values().filter(|b| filter.matches(b)).cloned().collect();
        matching.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));

        let total = matching.len() as u64;
        let skip = filter.page.saturating_sub(1) as usize * filter.limit as usize;
        let page = matching.into_iter().skip(skip).take(filter.limit as usize).collect();

        Ok(BookingPage {
            bookings: page,
            pagination: Pagination::new(filter.page, filter.limit, total),
        })
    }

    async fn get_booking(&self, id: Uuid) -> BackendResult<Booking> {
        self.bookings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("booking {id}")))
    }

    async fn create_booking(&self, booking: &NewBooking) -> BackendResult<Booking> {
        let service = ServiceRef::new(booking.service_type, booking.service_id);
        if !self.contains_service(&service).await {
            return Err(BackendError::NotFound(format!("service {service}")));
        }

        let created = booking.clone().into_booking(self.clock.now());
        self.bookings.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        expected_version: Option<u64>,
    ) -> BackendResult<()> {
        self.write_booking(id, expected_version, |b| b.status = status).await
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
        expected_version: Option<u64>,
    ) -> BackendResult<()> {
        self.write_booking(id, expected_version, |b| b.payment_status = payment_status)
            .await
    }

    async fn delete_booking(&self, id: Uuid) -> BackendResult<()> {
        self.bookings
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("booking {id}")))
    }

    async fn fetch_stats(&self) -> BackendResult<BookingStats> {
        Ok(BookingStats::from_bookings(self.bookings.read().await.values()))
    }
}

#[async_trait]
impl ServiceRepository for InMemoryBackend {
    async fn get_service(&self, service: &ServiceRef) -> BackendResult<Service> {
        self.services
            .read()
            .await
            .get(service)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("service {service}")))
    }

    async fn set_service_status(&self, service: &ServiceRef, status: ServiceStatus) -> BackendResult<()> {
        let mut services = self.services.write().await;
        let entry = services
            .get_mut(service)
            .ok_or_else(|| BackendError::NotFound(format!("service {service}")))?;
        entry.status = status;
        Ok(())
    }

    async fn delete_service(&self, service: &ServiceRef) -> BackendResult<DeleteServiceOutcome> {
        // Hold the bookings lock across the check and the delete
        let bookings = self.bookings.read().await;
        let blocking = count_future_active(bookings.values(), service, self.clock.today());
        if blocking > 0 {
            return Ok(DeleteServiceOutcome::HasFutureBookings {
                future_bookings_count: u32::try_from(blocking).unwrap_or(u32::MAX),
            });
        }

        // Schedules and other child records live inside the service
        self.services
            .write()
            .await
            .remove(service)
            .map(|_| DeleteServiceOutcome::Deleted)
            .ok_or_else(|| BackendError::NotFound(format!("service {service}")))
    }
}

#[async_trait]
impl PromotionRepository for InMemoryBackend {
    async fn list_promotions(&self) -> BackendResult<Vec<Promotion>> {
        Ok(self.promotions.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use voyage_catalog::ServiceDetails;
    use voyage_core::FixedClock;
    use voyage_shared::{Masked, Money};

    fn tour() -> Service {
        Service::new(
            "Sapa Trekking",
            Money::vnd(3_000_000),
            ServiceDetails::Tour {
                location: "Lao Cai".to_string(),
                duration_days: 2,
                departure_dates: Vec::new(),
            },
        )
    }

    fn new_booking(service: &Service, days_ahead: i64) -> NewBooking {
        NewBooking {
            service_type: service.service_type(),
            service_id: service.id,
            user_id: None,
            service_date: Utc::now().date_naive() + Duration::days(days_ahead),
            total_price: Money::vnd(3_000_000),
            contact_email: Masked::from("guest@example.com"),
            contact_phone: Masked::from("0901234567"),
            notes: None,
            passengers: Vec::new(),
            applied_promotion_id: None,
        }
    }

    #[tokio::test]
    async fn test_stale_write_is_rejected() {
        let backend = InMemoryBackend::default();
        let service = tour();
        backend.insert_service(service.clone()).await;
        let booking = backend.create_booking(&new_booking(&service, 10)).await.unwrap();

        backend
            .update_status(booking.id, BookingStatus::Confirmed, Some(0))
            .await
            .unwrap();
        let stale = backend.update_payment_status(booking.id, PaymentStatus::Paid, Some(0)).await;

        assert_eq!(stale, Err(BackendError::StaleWrite(booking.id)));
        let current = backend.get_booking(booking.id).await.unwrap();
        assert_eq!(current.payment_status, PaymentStatus::Pending);
        assert_eq!(current.version, 1);
    }

    #[tokio::test]
    async fn test_create_booking_requires_known_service() {
        let backend = InMemoryBackend::default();
        let result = backend.create_booking(&new_booking(&tour(), 1)).await;
        assert!(matches!(result, Err(BackendError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_service_guard_uses_clock() {
        let service = tour();
        let in_two_weeks = Utc::now() + Duration::days(14);

        let backend = InMemoryBackend::default();
        backend.insert_service(service.clone()).await;
        let booking = backend.create_booking(&new_booking(&service, 7)).await.unwrap();

        let outcome = backend.delete_service(&service.service_ref()).await.unwrap();
        assert_eq!(outcome, DeleteServiceOutcome::HasFutureBookings { future_bookings_count: 1 });

        // Two weeks later the booking is in the past and no longer blocks
        let later = InMemoryBackend::new(Arc::new(FixedClock(in_two_weeks)));
        later.insert_service(service.clone()).await;
        later.insert_booking(booking).await;
        let outcome = later.delete_service(&service.service_ref()).await.unwrap();
        assert_eq!(outcome, DeleteServiceOutcome::Deleted);
        assert!(!later.contains_service(&service.service_ref()).await);
    }

    #[tokio::test]
    async fn test_list_bookings_paginates() {
        let backend = InMemoryBackend::default();
        let service = tour();
        backend.insert_service(service.clone()).await;
        for _ in 0..5 {
            backend.create_booking(&new_booking(&service, 3)).await.unwrap();
        }

        let filter = BookingFilter { page: 2, limit: 2, ..BookingFilter::default() };
        let page = backend.list_bookings(&filter).await.unwrap();

        assert_eq!(page.bookings.len(), 2);
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.total_pages, 3);
    }
}
