use async_trait::async_trait;
use reqwest::header::IF_MATCH;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;
use voyage_catalog::{Promotion, Service, ServiceRef, ServiceStatus};
use voyage_core::{
    BackendError, BackendResult, Booking, BookingFilter, BookingPage, BookingRepository, BookingStats,
    BookingStatus, DeleteServiceOutcome, NewBooking, PaymentStatus, PromotionRepository, ServiceRepository,
};

use crate::app_config::BackendConfig;

/// REST client for the agency backend
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

#[derive(Serialize)]
struct StatusBody<T> {
    status: T,
}

#[derive(Serialize)]
struct PaymentBody {
    payment_status: PaymentStatus,
}

/// Body the backend sends when a service delete is refused
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FutureBookingsConflict {
    has_future_bookings: bool,
    #[serde(default)]
    future_bookings_count: u32,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self { http, base_url: config.base_url.clone() })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> BackendResult<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Backend request failed");
            BackendError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, %body, "Backend returned an error");
        Err(status_error(status, body))
    }

    async fn read_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> BackendResult<T> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Booking writes carry the last-read version so the backend can refuse stale ones
    async fn write_booking<B: Serialize + Sync>(
        &self,
        id: Uuid,
        path: String,
        body: &B,
        expected_version: Option<u64>,
    ) -> BackendResult<()> {
        let mut request = self.http.put(self.url(&path)).json(body);
        if let Some(version) = expected_version {
            request = request.header(IF_MATCH, version_tag(version));
        }

        match self.send(request).await {
            Err(BackendError::Status { status: 412, .. }) => Err(BackendError::StaleWrite(id)),
            other => other.map(|_| ()),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn version_tag(version: u64) -> String {
    format!("\"{}\"", version)
}

fn service_path(service: &ServiceRef) -> String {
    format!("services/{}/{}", service.service_type, service.id)
}

fn status_error(status: StatusCode, body: String) -> BackendError {
    if status == StatusCode::NOT_FOUND {
        BackendError::NotFound(body)
    } else {
        BackendError::Status { status: status.as_u16(), message: body }
    }
}

/// Success deletes. A refusal is recognised by its payload, whatever the status code.
fn delete_service_outcome(status: StatusCode, body: &str) -> BackendResult<DeleteServiceOutcome> {
    if status.is_success() {
        return Ok(DeleteServiceOutcome::Deleted);
    }

    match serde_json::from_str::<FutureBookingsConflict>(body) {
        Ok(conflict) if conflict.has_future_bookings => Ok(DeleteServiceOutcome::HasFutureBookings {
            future_bookings_count: conflict.future_bookings_count,
        }),
        _ => Err(status_error(status, body.to_string())),
    }
}

#[async_trait]
impl BookingRepository for BackendClient {
    async fn list_bookings(&self, filter: &BookingFilter) -> BackendResult<BookingPage> {
        tracing::debug!(page = filter.page, limit = filter.limit, "Listing bookings");
        self.read_json(self.http.get(self.url("bookings")).query(&filter.to_query())).await
    }

    async fn get_booking(&self, id: Uuid) -> BackendResult<Booking> {
        self.read_json(self.http.get(self.url(&format!("bookings/{}", id)))).await
    }

    async fn create_booking(&self, booking: &NewBooking) -> BackendResult<Booking> {
        tracing::debug!(service_type = %booking.service_type, service_id = %booking.service_id, "Creating booking");
        self.read_json(self.http.post(self.url("bookings")).json(booking)).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        expected_version: Option<u64>,
    ) -> BackendResult<()> {
        self.write_booking(id, format!("bookings/{}/status", id), &StatusBody { status }, expected_version)
            .await
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
        expected_version: Option<u64>,
    ) -> BackendResult<()> {
        self.write_booking(id, format!("bookings/{}/payment", id), &PaymentBody { payment_status }, expected_version)
            .await
    }

    async fn delete_booking(&self, id: Uuid) -> BackendResult<()> {
        self.send(self.http.delete(self.url(&format!("bookings/{}", id)))).await?;
        Ok(())
    }

    async fn fetch_stats(&self) -> BackendResult<BookingStats> {
        self.read_json(self.http.get(self.url("bookings/admin/stats"))).await
    }
}

#[async_trait]
impl ServiceRepository for BackendClient {
    async fn get_service(&self, service: &ServiceRef) -> BackendResult<Service> {
        self.read_json(self.http.get(self.url(&service_path(service)))).await
    }

    async fn set_service_status(&self, service: &ServiceRef, status: ServiceStatus) -> BackendResult<()> {
        let path = format!("{}/status", service_path(service));
        self.send(self.http.put(self.url(&path)).json(&StatusBody { status })).await?;
        Ok(())
    }

    async fn delete_service(&self, service: &ServiceRef) -> BackendResult<DeleteServiceOutcome> {
        let response = self
            .http
            .delete(self.url(&service_path(service)))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let outcome = delete_service_outcome(status, &body)?;

        if let DeleteServiceOutcome::HasFutureBookings { future_bookings_count } = outcome {
            tracing::info!(%service, future_bookings_count, "Backend refused service delete");
        }
        Ok(outcome)
    }
}

#[async_trait]
impl PromotionRepository for BackendClient {
    async fn list_promotions(&self) -> BackendResult<Vec<Promotion>> {
        self.read_json(self.http.get(self.url("promotions"))).await
    }
}
