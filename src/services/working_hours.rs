//! Staff working hours: the weekly window a staff member can be booked in

use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        slot::TimeRange,
        staff::{self, StaffWorkingHours, WorkingDay},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct WorkingHoursService {
    repository: Repository,
}

impl WorkingHoursService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, staff_id: Uuid, day_of_week: i16) -> AppResult<Option<StaffWorkingHours>> {
        self.repository.get_working_hours(staff_id, day_of_week).await
    }

    /// Bookable window on `date`. `None` when the staff member is off or has
    /// no row for that weekday.
    pub async fn window(&self, staff_id: Uuid, date: NaiveDate) -> AppResult<Option<TimeRange>> {
        let hours = self.get(staff_id, staff::day_of_week(date)).await?;
        Ok(hours.and_then(|h| h.window()))
    }

    /// Like [`Self::window`] but an unavailable day is a conflict
    pub async fn require_window(&self, staff_id: Uuid, date: NaiveDate) -> AppResult<TimeRange> {
        self.window(staff_id, date).await?.ok_or_else(|| {
            AppError::AvailabilityConflict("staff member is not available on this day".to_string())
        })
    }

    pub async fn list(&self, staff_id: Uuid) -> AppResult<Vec<StaffWorkingHours>> {
        self.repository.list_working_hours(staff_id).await
    }

    /// Replace the whole weekly schedule of a staff member
    pub async fn replace(
        &self,
        staff_id: Uuid,
        hours: Vec<WorkingDay>,
    ) -> AppResult<Vec<StaffWorkingHours>> {
        validate_week(&hours)?;
        tracing::info!(%staff_id, days = hours.len(), "replacing working hours");
        self.repository.replace_working_hours(staff_id, hours).await
    }

    /// Seed Mon-Fri 09:00-17:00, Sat 10:00-15:00, Sunday off
    pub async fn seed_defaults(&self, staff_id: Uuid) -> AppResult<Vec<StaffWorkingHours>> {
        self.replace(staff_id, staff::default_week()).await
    }
}

fn validate_week(hours: &[WorkingDay]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for day in hours {
        if !(0..=6).contains(&day.day_of_week) {
            return Err(AppError::Validation(format!(
                "day_of_week must be between 0 and 6, got {}",
                day.day_of_week
            )));
        }
        if !seen.insert(day.day_of_week) {
            return Err(AppError::Validation(format!(
                "day_of_week {} appears more than once",
                day.day_of_week
            )));
        }
        if !day.is_off && day.start_time >= day.end_time {
            return Err(AppError::Validation(format!(
                "start_time must be before end_time on day {}",
                day.day_of_week
            )));
        }
    }
    Ok(())
}
