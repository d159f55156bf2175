use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use voyage_shared::Money;

/// The four kinds of bookable product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Tour,
    Flight,
    Hotel,
    Transport,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Tour => "tour",
            ServiceType::Flight => "flight",
            ServiceType::Hotel => "hotel",
            ServiceType::Transport => "transport",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a service in the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Active,
    Inactive,
    Draft,
}

/// Identifies a service across crates and over the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRef {
    pub service_type: ServiceType,
    pub id: Uuid,
}

impl ServiceRef {
    pub fn new(service_type: ServiceType, id: Uuid) -> Self {
        Self { service_type, id }
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_type, self.id)
    }
}

/// Type-specific descriptive fields, discriminated by `service_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "service_type", rename_all = "snake_case")]
pub enum ServiceDetails {
    Tour {
        location: String,
        duration_days: u32,
        #[serde(default)]
        departure_dates: Vec<NaiveDate>,
    },
    Flight {
        airline: String,
        flight_number: String,
        origin: String,
        destination: String,
        departure_time: DateTime<Utc>,
    },
    Hotel {
        location: String,
        star_rating: u8,
        room_type: String,
    },
    Transport {
        vehicle_type: String,
        route_from: String,
        route_to: String,
        departure_time: DateTime<Utc>,
    },
}

impl ServiceDetails {
    pub fn service_type(&self) -> ServiceType {
        match self {
            ServiceDetails::Tour { .. } => ServiceType::Tour,
            ServiceDetails::Flight { .. } => ServiceType::Flight,
            ServiceDetails::Hotel { .. } => ServiceType::Hotel,
            ServiceDetails::Transport { .. } => ServiceType::Transport,
        }
    }

    /// Whether the schedule has an occurrence on `date` (UTC). Hotels take
    /// any check-in date; a tour without listed departures runs on demand.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        match self {
            ServiceDetails::Tour { departure_dates, .. } => {
                departure_dates.is_empty() || departure_dates.contains(&date)
            }
            ServiceDetails::Flight { departure_time, .. } | ServiceDetails::Transport { departure_time, .. } => {
                departure_time.date_naive() == date
            }
            ServiceDetails::Hotel { .. } => true,
        }
    }
}

/// A bookable product as loaded from the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub base_price: Money,
    pub status: ServiceStatus,
    #[serde(flatten)]
    pub details: ServiceDetails,
}

impl Service {
    pub fn new(name: impl Into<String>, base_price: Money, details: ServiceDetails) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            base_price,
            status: ServiceStatus::Active,
            details,
        }
    }

    pub fn service_type(&self) -> ServiceType {
        self.details.service_type()
    }

    pub fn service_ref(&self) -> ServiceRef {
        ServiceRef::new(self.service_type(), self.id)
    }

    /// Only active services accept new bookings
    pub fn is_bookable(&self) -> bool {
        self.status == ServiceStatus::Active
    }

    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.details.runs_on(date)
    }
}
