//! Staff working hours (one row per staff member and weekday)

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::slot::{hhmm, TimeRange};

/// Weekday index as stored in `staff_working_hours` (0=Sunday, 6=Saturday)
pub fn day_of_week(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StaffWorkingHours {
    pub staff_id: Uuid,
    /// Day of week (0=Sunday, 6=Saturday)
    pub day_of_week: i16,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "09:00")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "17:00")]
    pub end_time: NaiveTime,
    pub is_off: bool,
}

impl StaffWorkingHours {
    /// Open window for the day, `None` when the staff member is off
    pub fn window(&self) -> Option<TimeRange> {
        if self.is_off {
            None
        } else {
            Some(TimeRange::new(self.start_time, self.end_time))
        }
    }
}

/// One day of a working-hours update
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WorkingDay {
    /// Day of week (0=Sunday, 6=Saturday)
    pub day_of_week: i16,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "09:00")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "17:00")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub is_off: bool,
}

/// Replace working hours request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceWorkingHours {
    pub hours: Vec<WorkingDay>,
}

/// Week seeded for a newly created staff member:
/// Mon-Fri 09:00-17:00, Sat 10:00-15:00, Sun off.
pub fn default_week() -> Vec<WorkingDay> {
    let hm = |h: u32| NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN);
    (0..7)
        .map(|day| match day {
            0 => WorkingDay {
                day_of_week: day,
                start_time: hm(9),
                end_time: hm(17),
                is_off: true,
            },
            6 => WorkingDay {
                day_of_week: day,
                start_time: hm(10),
                end_time: hm(15),
                is_off: false,
            },
            _ => WorkingDay {
                day_of_week: day,
                start_time: hm(9),
                end_time: hm(17),
                is_off: false,
            },
        })
        .collect()
}
