use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voyage_shared::Money;

use crate::pricing::PricingError;
use crate::service::ServiceRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionType {
    Percentage,
    Fixed,
    /// Any type this build does not know. Pricing refuses it.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    Active,
    Inactive,
}

/// A discount rule as returned by `GET /promotions`.
///
/// `services`, `remaining_usage` and `is_expired` are resolved by the
/// backend. The expiry flag is only ever trusted in the "already expired"
/// direction; `end_date` is always checked against the current time too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    #[serde(rename = "type")]
    pub promotion_type: PromotionType,
    /// Percent (0-100) for percentage promotions, VND for fixed ones
    pub discount: Decimal,
    pub max_discount_value: Option<Money>,
    #[serde(default)]
    pub is_global: bool,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub usage_limit: Option<u32>,
    pub remaining_usage: Option<u32>,
    #[serde(default)]
    pub is_expired: bool,
    pub status: PromotionStatus,
}

impl Promotion {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_expired || self.end_date < now
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_usage == Some(0)
    }

    pub fn matches_service(&self, service: &ServiceRef) -> bool {
        self.is_global || self.services.contains(service)
    }

    /// The single applicability rule shared by every booking flow
    pub fn is_applicable_to(&self, service: &ServiceRef, now: DateTime<Utc>) -> bool {
        self.status == PromotionStatus::Active
            && !self.is_expired_at(now)
            && self.has_started(now)
            && !self.is_exhausted()
            && self.matches_service(service)
    }

    /// Data-integrity checks. A malformed promotion is an error, never a zero discount.
    pub fn validate(&self) -> Result<(), PricingError> {
        match self.promotion_type {
            PromotionType::Unknown => {
                return Err(PricingError::UnknownPromotionType(self.id));
            }
            PromotionType::Percentage => {
                if self.discount < Decimal::ZERO || self.discount > Decimal::ONE_HUNDRED {
                    return Err(PricingError::PercentageOutOfRange {
                        promotion_id: self.id,
                        value: self.discount,
                    });
                }
            }
            PromotionType::Fixed => {
                if self.discount < Decimal::ZERO {
                    return Err(PricingError::NegativeDiscount(self.id));
                }
            }
        }

        if self.max_discount_value.is_some_and(Money::is_negative) {
            return Err(PricingError::NegativeDiscount(self.id));
        }

        Ok(())
    }
}

/// Promotions a customer may pick for `service` right now. Malformed entries
/// are logged and left out.
pub fn applicable_promotions<'a>(
    promotions: &'a [Promotion],
    service: &ServiceRef,
    now: DateTime<Utc>,
) -> Vec<&'a Promotion> {
    promotions
        .iter()
        .filter(|promotion| match promotion.validate() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(promotion_id = %promotion.id, error = %err, "Skipping malformed promotion");
                false
            }
        })
        .filter(|promotion| promotion.is_applicable_to(service, now))
        .collect()
}
