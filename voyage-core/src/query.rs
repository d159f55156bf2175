use serde::{Deserialize, Serialize};
use voyage_catalog::ServiceType;
use voyage_shared::Money;

use crate::booking::{Booking, BookingStatus, PaymentStatus};

/// Query for `GET /bookings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub service_type: Option<ServiceType>,
    pub page: u32,
    pub limit: u32,
}

impl Default for BookingFilter {
    fn default() -> Self {
        Self {
            status: None,
            payment_status: None,
            service_type: None,
            page: 1,
            limit: 20,
        }
    }
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.map_or(true, |s| booking.status == s)
            && self.payment_status.map_or(true, |p| booking.payment_status == p)
            && self.service_type.map_or(true, |t| booking.service_type == t)
    }

    /// Query-string pairs, skipping unset filters
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(status) = self.status {
            query.push(("status", status.to_string()));
        }
        if let Some(payment_status) = self.payment_status {
            query.push(("payment_status", payment_status.to_string()));
        }
        if let Some(service_type) = self.service_type {
            query.push(("service_type", service_type.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
        };
        Self { page, limit, total, total_pages }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingPage {
    pub bookings: Vec<Booking>,
    pub pagination: Pagination,
}

/// Aggregates from `GET /bookings/admin/stats`. Display input only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStats {
    pub total_bookings: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Sum of totals of paid bookings
    pub total_revenue: Money,
}

impl BookingStats {
    pub fn from_bookings<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> Self {
        bookings.into_iter().fold(Self::default(), |mut stats, booking| {
            stats.total_bookings += 1;
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::Confirmed => stats.confirmed += 1,
                BookingStatus::Completed => stats.completed += 1,
                BookingStatus::Cancelled => stats.cancelled += 1,
            }
            if booking.payment_status == PaymentStatus::Paid {
                stats.total_revenue = Money::vnd(
                    stats.total_revenue.amount().saturating_add(booking.total_price.amount()),
                );
            }
            stats
        })
    }
}

/// Result of `DELETE /services/{type}/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteServiceOutcome {
    Deleted,
    /// The backend refused: these bookings still depend on the service
    HasFutureBookings { future_bookings_count: u32 },
}
