//! Business logic services

pub mod appointments;
pub mod availability;
pub mod booking;
pub mod payments;
pub mod promos;
pub mod slots;
pub mod working_hours;

use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};

use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub working_hours: working_hours::WorkingHoursService,
    pub availability: availability::AvailabilityService,
    pub booking: booking::BookingService,
    pub appointments: appointments::AppointmentsService,
    pub payments: payments::PaymentsService,
    pub promos: promos::PromoService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: BookingConfig) -> Self {
        let working_hours = working_hours::WorkingHoursService::new(repository.clone());
        let stride = chrono::Duration::minutes(i64::from(config.slot_stride_minutes));
        let lock_timeout = Duration::from_millis(config.lock_timeout_ms);

        Self {
            availability: availability::AvailabilityService::new(
                repository.clone(),
                working_hours.clone(),
                stride,
            ),
            booking: booking::BookingService::new(
                repository.clone(),
                working_hours.clone(),
                lock_timeout,
            ),
            appointments: appointments::AppointmentsService::new(repository.clone()),
            payments: payments::PaymentsService::new(repository.clone()),
            promos: promos::PromoService::new(repository.clone()),
            working_hours,
            repository,
        }
    }

    /// Readiness probe of the underlying store
    pub async fn ping(&self) -> AppResult<()> {
        self.repository
            .ping()
            .await
            .map_err(|e| AppError::Persistence(format!("store unreachable: {}", e)))
    }
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

/// Parse an `HH:MM` wall-clock time
pub fn parse_time(raw: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| AppError::Validation(format!("Invalid time '{}', expected HH:MM", raw)))
}
