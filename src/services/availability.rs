//! Read-only slot availability for a staff member, service and date

use chrono::Duration;
use uuid::Uuid;

use super::{
    parse_date,
    slots::{mark_availability, SlotGenerator},
    working_hours::WorkingHoursService,
};
use crate::{
    error::{AppError, AppResult},
    models::TimeSlot,
    repository::Repository,
};

#[derive(Clone)]
pub struct AvailabilityService {
    repository: Repository,
    working_hours: WorkingHoursService,
    stride: Duration,
}

impl AvailabilityService {
    pub fn new(repository: Repository, working_hours: WorkingHoursService, stride: Duration) -> Self {
        Self {
            repository,
            working_hours,
            stride,
        }
    }

    /// Candidate slots in chronological order, each marked available or not.
    /// Takes no locks; the answer may be stale by the time a booking arrives.
    pub async fn available_slots(
        &self,
        staff_id: Uuid,
        service_id: Uuid,
        date: &str,
    ) -> AppResult<Vec<TimeSlot>> {
        let service = self
            .repository
            .get_service(service_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", service_id)))?;
        let date = parse_date(date)?;

        let Some(window) = self.working_hours.window(staff_id, date).await? else {
            tracing::debug!(%staff_id, %date, "staff member off, no slots");
            return Ok(Vec::new());
        };

        let booked: Vec<_> = self
            .repository
            .active_appointments(staff_id, date)
            .await?
            .iter()
            .map(|a| a.range())
            .collect();

        let candidates = SlotGenerator::new(window, service.duration(), self.stride);
        Ok(mark_availability(candidates, &booked))
    }
}
