use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;
use voyage_catalog::{
    applicable_promotions, PricingEngine, PricingError, PricingResult, Promotion, Service, ServiceRef, ServiceType,
};
use voyage_core::{BackendError, Booking, BookingRepository, Clock, NewBooking, PromotionRepository};
use voyage_shared::{Masked, Passenger, PassengerComposition};

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Service {0} is not open for booking")]
    ServiceUnavailable(ServiceRef),

    #[error("Promotion {0} does not apply to this booking")]
    PromotionNotApplicable(Uuid),

    #[error("Expected {expected} passenger record(s), got {actual}")]
    PassengerMismatch { expected: usize, actual: usize },

    #[error("Service date {0} is in the past")]
    DateInPast(NaiveDate),

    #[error("{service} does not run on {date}")]
    NotScheduled { service: ServiceRef, date: NaiveDate },
}

/// What a booking form submits
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub service: Service,
    pub promotion: Option<Promotion>,
    /// Head count for tours, hotels and transport. Flights derive it from `passengers`.
    pub composition: PassengerComposition,
    pub passengers: Vec<Passenger>,
    pub service_date: NaiveDate,
    pub user_id: Option<Uuid>,
    pub contact_email: String,
    pub contact_phone: String,
    pub notes: Option<String>,
}

/// Prices a booking form and submits it to the backend
pub struct Checkout {
    pricing: PricingEngine,
    bookings: Arc<dyn BookingRepository>,
    promotions: Arc<dyn PromotionRepository>,
    clock: Arc<dyn Clock>,
}

impl Checkout {
    pub fn new(
        pricing: PricingEngine,
        bookings: Arc<dyn BookingRepository>,
        promotions: Arc<dyn PromotionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { pricing, bookings, promotions, clock }
    }

    /// Promotions the customer can choose from for `service`
    pub async fn offers_for(&self, service: &ServiceRef) -> Result<Vec<Promotion>, CheckoutError> {
        let all = self.promotions.list_promotions().await?;
        Ok(applicable_promotions(&all, service, self.clock.now())
            .into_iter()
            .cloned()
            .collect())
    }

    /// Live price for the current form state
    pub fn quote(
        &self,
        service: &Service,
        promotion: Option<&Promotion>,
        composition: PassengerComposition,
        passengers: &[Passenger],
    ) -> Result<PricingResult, CheckoutError> {
        let now = self.clock.now();
        let result = match service.service_type() {
            ServiceType::Flight => self.pricing.compute_flight_total(
                &service.service_ref(),
                service.base_price,
                passengers,
                promotion,
                now,
            )?,
            _ => self.pricing.quote(service, composition, promotion, now)?,
        };
        Ok(result)
    }

    pub async fn submit(&self, request: BookingRequest) -> Result<Booking, CheckoutError> {
        let service = &request.service;
        let service_ref = service.service_ref();

        if !service.is_bookable() {
            return Err(CheckoutError::ServiceUnavailable(service_ref));
        }
        if request.service_date < self.clock.today() {
            return Err(CheckoutError::DateInPast(request.service_date));
        }
        if !service.runs_on(request.service_date) {
            return Err(CheckoutError::NotScheduled {
                service: service_ref,
                date: request.service_date,
            });
        }
        if let Some(promotion) = &request.promotion {
            promotion.validate()?;
            if !promotion.is_applicable_to(&service_ref, self.clock.now()) {
                return Err(CheckoutError::PromotionNotApplicable(promotion.id));
            }
        }
        check_passengers(&request)?;

        let priced = self.quote(
            service,
            request.promotion.as_ref(),
            request.composition,
            &request.passengers,
        )?;

        let new_booking = NewBooking {
            service_type: service_ref.service_type,
            service_id: service_ref.id,
            user_id: request.user_id,
            service_date: request.service_date,
            total_price: priced.final_total,
            contact_email: Masked::new(request.contact_email),
            contact_phone: Masked::new(request.contact_phone),
            notes: request.notes,
            passengers: request.passengers,
            applied_promotion_id: priced.applied_promotion.map(|p| p.id),
        };

        let booking = self.bookings.create_booking(&new_booking).await?;
        tracing::info!(
            booking_id = %booking.id,
            service = %service_ref,
            total = booking.total_price.amount(),
            "Booking submitted"
        );
        Ok(booking)
    }
}

/// One passenger record per seat. Flights always need the list; other
/// services may omit it.
fn check_passengers(request: &BookingRequest) -> Result<(), CheckoutError> {
    let actual = request.passengers.len();
    match request.service.service_type() {
        ServiceType::Flight => {
            if actual == 0 {
                return Err(CheckoutError::PassengerMismatch { expected: 1, actual });
            }
        }
        _ => {
            let expected = request.composition.total() as usize;
            if actual != 0 && actual != expected {
                return Err(CheckoutError::PassengerMismatch { expected, actual });
            }
        }
    }
    Ok(())
}
