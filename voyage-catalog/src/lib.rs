pub mod service;
pub mod promotion;
pub mod pricing;

pub use service::{Service, ServiceDetails, ServiceRef, ServiceStatus, ServiceType};
pub use promotion::{applicable_promotions, Promotion, PromotionStatus, PromotionType};
pub use pricing::{AppliedPromotion, PricingConfig, PricingEngine, PricingError, PricingResult};
