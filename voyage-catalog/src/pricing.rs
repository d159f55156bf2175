use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voyage_shared::{Money, MoneyError, Passenger, PassengerComposition, PassengerType};

use crate::promotion::{Promotion, PromotionType};
use crate::service::{Service, ServiceRef, ServiceType};

/// Children on tours pay 70% of the adult price
pub const TOUR_CHILD_RATE: Decimal = Decimal::from_parts(70, 0, 0, false, 2);
/// Children in hotels pay 70% of the adult price
pub const HOTEL_CHILD_RATE: Decimal = Decimal::from_parts(70, 0, 0, false, 2);
/// Children on ground transport pay 75% of the adult price
pub const TRANSPORT_CHILD_RATE: Decimal = Decimal::from_parts(75, 0, 0, false, 2);

pub const FLIGHT_ADULT_RATE: Decimal = Decimal::ONE;
pub const FLIGHT_CHILD_RATE: Decimal = Decimal::from_parts(75, 0, 0, false, 2);
pub const FLIGHT_INFANT_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Interactive booking forms cap the party at this many seats
pub const DEFAULT_MAX_PARTY_SIZE: u32 = 10;

/// Per-category fare multipliers applied to a flight's base fare
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightFareRates {
    pub adult: Decimal,
    pub child: Decimal,
    pub infant: Decimal,
}

impl Default for FlightFareRates {
    fn default() -> Self {
        Self {
            adult: FLIGHT_ADULT_RATE,
            child: FLIGHT_CHILD_RATE,
            infant: FLIGHT_INFANT_RATE,
        }
    }
}

impl FlightFareRates {
    pub fn rate_for(&self, passenger_type: PassengerType) -> Decimal {
        match passenger_type {
            PassengerType::Adult => self.adult,
            PassengerType::Child => self.child,
            PassengerType::Infant => self.infant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_tour_child_rate")]
    pub tour_child_rate: Decimal,
    #[serde(default = "default_hotel_child_rate")]
    pub hotel_child_rate: Decimal,
    #[serde(default = "default_transport_child_rate")]
    pub transport_child_rate: Decimal,
    #[serde(default)]
    pub flight_fares: FlightFareRates,
    /// Soft business cap on adults + children. `None` disables it.
    #[serde(default = "default_max_party_size")]
    pub max_party_size: Option<u32>,
}

fn default_tour_child_rate() -> Decimal { TOUR_CHILD_RATE }
fn default_hotel_child_rate() -> Decimal { HOTEL_CHILD_RATE }
fn default_transport_child_rate() -> Decimal { TRANSPORT_CHILD_RATE }
fn default_max_party_size() -> Option<u32> { Some(DEFAULT_MAX_PARTY_SIZE) }

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tour_child_rate: TOUR_CHILD_RATE,
            hotel_child_rate: HOTEL_CHILD_RATE,
            transport_child_rate: TRANSPORT_CHILD_RATE,
            flight_fares: FlightFareRates::default(),
            max_party_size: default_max_party_size(),
        }
    }
}

impl PricingConfig {
    /// Blanket child rate for head-count pricing. Flights have none; each
    /// passenger is priced at their fare category instead.
    pub fn child_rate(&self, service_type: ServiceType) -> Option<Decimal> {
        match service_type {
            ServiceType::Tour => Some(self.tour_child_rate),
            ServiceType::Hotel => Some(self.hotel_child_rate),
            ServiceType::Transport => Some(self.transport_child_rate),
            ServiceType::Flight => None,
        }
    }
}

/// Promotion details echoed back for the receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPromotion {
    pub id: Uuid,
    pub code: String,
    pub promotion_type: PromotionType,
}

/// Derived totals; recomputed on every composition or promotion change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub adult_subtotal: Money,
    pub child_subtotal: Money,
    pub infant_subtotal: Money,
    pub subtotal_before_discount: Money,
    pub discount: Money,
    pub final_total: Money,
    pub applied_promotion: Option<AppliedPromotion>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Base price must not be negative: {0}")]
    NegativeBasePrice(Money),

    #[error("A booking needs at least one adult")]
    NoAdults,

    #[error("Party of {requested} exceeds the maximum of {max}")]
    PartyTooLarge { requested: u32, max: u32 },

    #[error("{infants} infant(s) need at least as many adults, got {adults}")]
    TooManyInfants { infants: u32, adults: u32 },

    #[error("Flight {0} is priced per passenger, not by head count")]
    HeadCountPricingForFlight(ServiceRef),

    #[error("Promotion {0} has an unknown type")]
    UnknownPromotionType(Uuid),

    #[error("Promotion {promotion_id} has a percentage outside 0-100: {value}")]
    PercentageOutOfRange { promotion_id: Uuid, value: Decimal },

    #[error("Promotion {0} has a negative discount")]
    NegativeDiscount(Uuid),

    #[error(transparent)]
    Overflow(#[from] MoneyError),
}

/// Turns a price basis, a party and an optional promotion into a payable total
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Head-count pricing for tours, hotels and transport.
    ///
    /// `promotion` is applied only if it is applicable to `service` at `now`;
    /// a malformed promotion is an error either way.
    pub fn compute_total(
        &self,
        service: &ServiceRef,
        base_price: Money,
        composition: PassengerComposition,
        promotion: Option<&Promotion>,
        now: DateTime<Utc>,
    ) -> Result<PricingResult, PricingError> {
        let child_rate = self
            .config
            .child_rate(service.service_type)
            .ok_or(PricingError::HeadCountPricingForFlight(*service))?;
        self.check_inputs(base_price, composition)?;
        if let Some(promotion) = promotion {
            promotion.validate()?;
        }

        let adult_subtotal = base_price.times(composition.adults)?;
        let child_subtotal = base_price.scale(child_rate, composition.children)?;

        self.finish(service, adult_subtotal, child_subtotal, Money::ZERO, promotion, now)
    }

    /// Flight pricing: every passenger is priced individually at the fare of
    /// their category.
    pub fn compute_flight_total(
        &self,
        service: &ServiceRef,
        base_price: Money,
        passengers: &[Passenger],
        promotion: Option<&Promotion>,
        now: DateTime<Utc>,
    ) -> Result<PricingResult, PricingError> {
        let seated = PassengerComposition::from_passengers(passengers);
        self.check_inputs(base_price, seated)?;

        // One lap infant per adult
        let infants = passengers
            .iter()
            .filter(|p| p.passenger_type == PassengerType::Infant)
            .count();
        let infants = u32::try_from(infants).unwrap_or(u32::MAX);
        if infants > seated.adults {
            return Err(PricingError::TooManyInfants { infants, adults: seated.adults });
        }

        if let Some(promotion) = promotion {
            promotion.validate()?;
        }

        let fares = &self.config.flight_fares;
        let (mut adult, mut child, mut infant) = (Money::ZERO, Money::ZERO, Money::ZERO);
        for passenger in passengers {
            let fare = base_price.scale(fares.rate_for(passenger.passenger_type), 1)?;
            let bucket = match passenger.passenger_type {
                PassengerType::Adult => &mut adult,
                PassengerType::Child => &mut child,
                PassengerType::Infant => &mut infant,
            };
            *bucket = bucket.checked_add(fare)?;
        }

        self.finish(service, adult, child, infant, promotion, now)
    }

    /// Price a loaded tour, hotel or transport service with a head count.
    /// Flights are refused; use [`Self::compute_flight_total`].
    pub fn quote(
        &self,
        service: &Service,
        composition: PassengerComposition,
        promotion: Option<&Promotion>,
        now: DateTime<Utc>,
    ) -> Result<PricingResult, PricingError> {
        self.compute_total(&service.service_ref(), service.base_price, composition, promotion, now)
    }

    fn check_inputs(&self, base_price: Money, composition: PassengerComposition) -> Result<(), PricingError> {
        if base_price.is_negative() {
            return Err(PricingError::NegativeBasePrice(base_price));
        }
        if composition.adults < 1 {
            return Err(PricingError::NoAdults);
        }
        if let Some(max) = self.config.max_party_size {
            let requested = composition.total();
            if requested > max {
                return Err(PricingError::PartyTooLarge { requested, max });
            }
        }
        Ok(())
    }

    fn finish(
        &self,
        service: &ServiceRef,
        adult_subtotal: Money,
        child_subtotal: Money,
        infant_subtotal: Money,
        promotion: Option<&Promotion>,
        now: DateTime<Utc>,
    ) -> Result<PricingResult, PricingError> {
        let subtotal = adult_subtotal
            .checked_add(child_subtotal)?
            .checked_add(infant_subtotal)?;

        let applicable = promotion.filter(|p| p.is_applicable_to(service, now));
        let discount = match applicable {
            Some(promotion) => discount_for(promotion, subtotal)?,
            None => Money::ZERO,
        };
        let final_total = subtotal.checked_sub(discount)?.max(Money::ZERO);

        Ok(PricingResult {
            adult_subtotal,
            child_subtotal,
            infant_subtotal,
            subtotal_before_discount: subtotal,
            discount,
            final_total,
            applied_promotion: applicable.map(|p| AppliedPromotion {
                id: p.id,
                code: p.code.clone(),
                promotion_type: p.promotion_type,
            }),
        })
    }
}

fn discount_for(promotion: &Promotion, subtotal: Money) -> Result<Money, PricingError> {
    match promotion.promotion_type {
        PromotionType::Percentage => {
            let raw = subtotal
                .to_decimal()
                .checked_mul(promotion.discount)
                .map(|v| v / Decimal::ONE_HUNDRED)
                .ok_or(MoneyError::Overflow("percentage discount"))?;
            let discount = Money::from_decimal(raw)?;
            Ok(match promotion.max_discount_value {
                Some(cap) => discount.min(cap),
                None => discount,
            })
        }
        PromotionType::Fixed => Ok(Money::from_decimal(promotion.discount)?.min(subtotal)),
        PromotionType::Unknown => Err(PricingError::UnknownPromotionType(promotion.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotion::test_support::promotion;

    fn tour() -> ServiceRef {
        ServiceRef::new(ServiceType::Tour, Uuid::new_v4())
    }

    #[test]
    fn test_family_tour_without_promotion() {
        let engine = PricingEngine::default();
        let result = engine
            .compute_total(&tour(), Money::vnd(5_000_000), PassengerComposition::new(2, 1), None, Utc::now())
            .unwrap();

        assert_eq!(result.adult_subtotal, Money::vnd(10_000_000));
        assert_eq!(result.child_subtotal, Money::vnd(3_500_000));
        assert_eq!(result.subtotal_before_discount, Money::vnd(13_500_000));
        assert_eq!(result.discount, Money::ZERO);
        assert_eq!(result.final_total, Money::vnd(13_500_000));
        assert!(result.applied_promotion.is_none());
    }

    #[test]
    fn test_percentage_discount_is_capped() {
        let engine = PricingEngine::default();
        let mut promo = promotion(PromotionType::Percentage, Decimal::from(20));
        promo.max_discount_value = Some(Money::vnd(2_000_000));

        let result = engine
            .compute_total(
                &tour(),
                Money::vnd(5_000_000),
                PassengerComposition::new(2, 1),
                Some(&promo),
                Utc::now(),
            )
            .unwrap();

        // 20% of 13.5M is 2.7M, capped at 2M
        assert_eq!(result.discount, Money::vnd(2_000_000));
        assert_eq!(result.final_total, Money::vnd(11_500_000));
        assert_eq!(result.applied_promotion.unwrap().id, promo.id);
    }

    #[test]
    fn test_fixed_discount_never_goes_negative() {
        let engine = PricingEngine::default();
        let promo = promotion(PromotionType::Fixed, Decimal::from(5_000_000));

        let result = engine
            .compute_total(
                &tour(),
                Money::vnd(1_000_000),
                PassengerComposition::new(1, 0),
                Some(&promo),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(result.discount, Money::vnd(1_000_000));
        assert_eq!(result.final_total, Money::ZERO);
    }

    #[test]
    fn test_percentage_rounds_to_nearest_dong() {
        let engine = PricingEngine::default();
        let promo = promotion(PromotionType::Percentage, Decimal::new(125, 1)); // 12.5%

        let result = engine
            .compute_total(&tour(), Money::vnd(1_001), PassengerComposition::new(1, 0), Some(&promo), Utc::now())
            .unwrap();

        // 1001 * 12.5% = 125.125
        assert_eq!(result.discount, Money::vnd(125));
        assert_eq!(result.final_total, Money::vnd(876));
    }

    #[test]
    fn test_transport_uses_its_own_child_rate() {
        let engine = PricingEngine::default();
        let bus = ServiceRef::new(ServiceType::Transport, Uuid::new_v4());

        let result = engine
            .compute_total(&bus, Money::vnd(400_000), PassengerComposition::new(1, 2), None, Utc::now())
            .unwrap();

        assert_eq!(result.child_subtotal, Money::vnd(600_000));
        assert_eq!(result.final_total, Money::vnd(1_000_000));
    }

    #[test]
    fn test_promotion_for_other_service_is_ignored() {
        let engine = PricingEngine::default();
        let mut promo = promotion(PromotionType::Percentage, Decimal::from(50));
        promo.is_global = false;
        promo.services = vec![tour()];

        let result = engine
            .compute_total(&tour(), Money::vnd(1_000_000), PassengerComposition::new(1, 0), Some(&promo), Utc::now())
            .unwrap();

        assert_eq!(result.discount, Money::ZERO);
        assert!(result.applied_promotion.is_none());
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let engine = PricingEngine::default();
        let now = Utc::now();

        assert!(matches!(
            engine.compute_total(&tour(), Money::vnd(-1), PassengerComposition::new(1, 0), None, now),
            Err(PricingError::NegativeBasePrice(_))
        ));
        assert!(matches!(
            engine.compute_total(&tour(), Money::vnd(100), PassengerComposition::new(0, 2), None, now),
            Err(PricingError::NoAdults)
        ));
        assert!(matches!(
            engine.compute_total(&tour(), Money::vnd(100), PassengerComposition::new(6, 5), None, now),
            Err(PricingError::PartyTooLarge { requested: 11, max: 10 })
        ));

        let unknown = promotion(PromotionType::Unknown, Decimal::from(10));
        assert!(matches!(
            engine.compute_total(&tour(), Money::vnd(100), PassengerComposition::new(1, 0), Some(&unknown), now),
            Err(PricingError::UnknownPromotionType(_))
        ));
    }

    #[test]
    fn test_party_cap_can_be_disabled() {
        let engine = PricingEngine::new(PricingConfig {
            max_party_size: None,
            ..PricingConfig::default()
        });

        let result = engine
            .compute_total(&tour(), Money::vnd(100), PassengerComposition::new(20, 20), None, Utc::now())
            .unwrap();
        assert_eq!(result.final_total, Money::vnd(3_400));
    }

    #[test]
    fn test_totals_hold_their_bounds() {
        let engine = PricingEngine::default();
        let service = tour();
        let now = Utc::now();
        let mut capped = promotion(PromotionType::Percentage, Decimal::from(35));
        capped.max_discount_value = Some(Money::vnd(750_000));
        let fixed = promotion(PromotionType::Fixed, Decimal::from(2_500_000));

        for base in [0, 1, 99_999, 1_250_000, 7_000_001] {
            for adults in 1..=4 {
                for children in 0..=3 {
                    let party = PassengerComposition::new(adults, children);
                    let base = Money::vnd(base);

                    let plain = engine.compute_total(&service, base, party, None, now).unwrap();
                    assert!(plain.final_total >= Money::ZERO);

                    let with_cap = engine.compute_total(&service, base, party, Some(&capped), now).unwrap();
                    assert!(with_cap.discount <= Money::vnd(750_000));
                    assert!(with_cap.final_total >= Money::ZERO);

                    let with_fixed = engine.compute_total(&service, base, party, Some(&fixed), now).unwrap();
                    assert!(with_fixed.discount <= with_fixed.subtotal_before_discount);
                    assert!(with_fixed.final_total >= Money::ZERO);
                }
            }
        }
    }

    #[test]
    fn test_compute_total_is_idempotent() {
        let engine = PricingEngine::default();
        let service = tour();
        let now = Utc::now();
        let promo = promotion(PromotionType::Percentage, Decimal::from(15));
        let party = PassengerComposition::new(3, 2);

        let first = engine.compute_total(&service, Money::vnd(2_345_678), party, Some(&promo), now).unwrap();
        let second = engine.compute_total(&service, Money::vnd(2_345_678), party, Some(&promo), now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flight_prices_each_passenger() {
        let engine = PricingEngine::default();
        let flight = ServiceRef::new(ServiceType::Flight, Uuid::new_v4());
        let passengers = vec![
            Passenger::new("Mr", "Minh", "Le", "VN", PassengerType::Adult),
            Passenger::new("Miss", "Mai", "Le", "VN", PassengerType::Child),
            Passenger::new("Mstr", "Khoa", "Le", "VN", PassengerType::Infant),
        ];

        let result = engine
            .compute_flight_total(&flight, Money::vnd(2_000_000), &passengers, None, Utc::now())
            .unwrap();

        assert_eq!(result.adult_subtotal, Money::vnd(2_000_000));
        assert_eq!(result.child_subtotal, Money::vnd(1_500_000));
        assert_eq!(result.infant_subtotal, Money::vnd(200_000));
        assert_eq!(result.final_total, Money::vnd(3_700_000));
    }

    #[test]
    fn test_flight_needs_an_adult() {
        let engine = PricingEngine::default();
        let flight = ServiceRef::new(ServiceType::Flight, Uuid::new_v4());
        let passengers = vec![Passenger::new("Miss", "Mai", "Le", "VN", PassengerType::Child)];

        assert!(matches!(
            engine.compute_flight_total(&flight, Money::vnd(2_000_000), &passengers, None, Utc::now()),
            Err(PricingError::NoAdults)
        ));
    }

    #[test]
    fn test_flight_is_not_priced_by_head_count() {
        let engine = PricingEngine::default();
        let flight = ServiceRef::new(ServiceType::Flight, Uuid::new_v4());

        assert_eq!(engine.config().child_rate(ServiceType::Flight), None);
        assert_eq!(
            engine.compute_total(&flight, Money::vnd(1_000_000), PassengerComposition::new(1, 1), None, Utc::now()),
            Err(PricingError::HeadCountPricingForFlight(flight))
        );
    }

    #[test]
    fn test_quote_refuses_flight_service() {
        let engine = PricingEngine::default();
        let service = Service::new(
            "DAD-HAN",
            Money::vnd(1_000_000),
            crate::service::ServiceDetails::Flight {
                airline: "VJ".to_string(),
                flight_number: "VJ512".to_string(),
                origin: "DAD".to_string(),
                destination: "HAN".to_string(),
                departure_time: Utc::now(),
            },
        );

        assert!(matches!(
            engine.quote(&service, PassengerComposition::new(1, 1), None, Utc::now()),
            Err(PricingError::HeadCountPricingForFlight(_))
        ));
    }

    #[test]
    fn test_infants_cannot_outnumber_adults() {
        let engine = PricingEngine::default();
        let flight = ServiceRef::new(ServiceType::Flight, Uuid::new_v4());
        let mut passengers = vec![Passenger::new("Mr", "Minh", "Le", "VN", PassengerType::Adult)];
        passengers.extend((0..2).map(|_| Passenger::new("Mstr", "Khoa", "Le", "VN", PassengerType::Infant)));

        assert_eq!(
            engine.compute_flight_total(&flight, Money::vnd(2_000_000), &passengers, None, Utc::now()),
            Err(PricingError::TooManyInfants { infants: 2, adults: 1 })
        );

        passengers.pop();
        assert!(engine
            .compute_flight_total(&flight, Money::vnd(2_000_000), &passengers, None, Utc::now())
            .is_ok());
    }

    #[test]
    fn test_malformed_promotions_fail_before_pricing() {
        let engine = PricingEngine::default();
        let service = tour();
        let party = PassengerComposition::new(1, 0);
        let now = Utc::now();

        let negative_fixed = promotion(PromotionType::Fixed, Decimal::from(-50_000));
        assert_eq!(
            engine.compute_total(&service, Money::vnd(1_000_000), party, Some(&negative_fixed), now),
            Err(PricingError::NegativeDiscount(negative_fixed.id))
        );

        let mut negative_cap = promotion(PromotionType::Percentage, Decimal::from(10));
        negative_cap.max_discount_value = Some(Money::vnd(-1));
        assert_eq!(
            engine.compute_total(&service, Money::vnd(1_000_000), party, Some(&negative_cap), now),
            Err(PricingError::NegativeDiscount(negative_cap.id))
        );

        let too_generous = promotion(PromotionType::Percentage, Decimal::from(120));
        assert_eq!(
            engine.compute_total(&service, Money::vnd(1_000_000), party, Some(&too_generous), now),
            Err(PricingError::PercentageOutOfRange {
                promotion_id: too_generous.id,
                value: Decimal::from(120),
            })
        );

        // Still an error when the promotion would not apply to this service
        let mut elsewhere = promotion(PromotionType::Fixed, Decimal::from(-1));
        elsewhere.is_global = false;
        assert!(matches!(
            engine.compute_total(&service, Money::vnd(1_000_000), party, Some(&elsewhere), now),
            Err(PricingError::NegativeDiscount(_))
        ));
    }
}
