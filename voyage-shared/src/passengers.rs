use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pii::Masked;

/// Head count used by tour, hotel and transport bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerComposition {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

impl PassengerComposition {
    pub fn new(adults: u32, children: u32) -> Self {
        Self { adults, children }
    }

    pub fn total(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    /// Collapse a flight-style passenger list into a head count. Infants
    /// travel on an adult's lap and are not counted as seats.
    pub fn from_passengers(passengers: &[Passenger]) -> Self {
        passengers.iter().fold(Self::new(0, 0), |mut acc, p| {
            match p.passenger_type {
                PassengerType::Adult => acc.adults += 1,
                PassengerType::Child => acc.children += 1,
                PassengerType::Infant => {}
            }
            acc
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassengerType {
    #[default]
    Adult,
    Child,
    Infant,
}

/// One traveller on a booking. Created at submission time and never amended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<NaiveDate>,
    pub nationality: String,
    pub passport_number: Option<Masked<String>>,
    pub special_requirements: Option<String>,
    #[serde(default)]
    pub passenger_type: PassengerType,
}

impl Passenger {
    pub fn new(
        title: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        nationality: impl Into<String>,
        passenger_type: PassengerType,
    ) -> Self {
        Self {
            title: title.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            dob: None,
            nationality: nationality.into(),
            passport_number: None,
            special_requirements: None,
            passenger_type,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.title, self.first_name, self.last_name)
    }
}
