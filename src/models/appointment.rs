//! Appointment model and booking request types

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    payment::Payment,
    slot::{hhmm, TimeRange},
};

/// Appointment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Whether the appointment still occupies the staff calendar
    pub fn occupies_calendar(self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    /// Pending and confirmed appointments may still be moved, cancelled,
    /// completed or marked as no-show.
    pub fn is_open(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NoShow => "no_show",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "14:00")]
    pub start_time: NaiveTime,
    /// Always start_time + service duration
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "15:00")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub promo_code_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }
}

/// Appointment row about to be inserted by the booking transaction
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub promo_code_id: Option<Uuid>,
}

/// Book appointment request. Any `end_time` sent by the client is ignored.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookAppointment {
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    /// Appointment date (YYYY-MM-DD)
    #[validate(length(min = 1, message = "date is required"))]
    pub date: String,
    /// Start time (HH:MM)
    #[validate(length(min = 1, message = "start_time is required"))]
    pub start_time: String,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    pub notes: Option<String>,
    #[validate(length(max = 50, message = "promo_code must be at most 50 characters"))]
    pub promo_code: Option<String>,
}

/// Reschedule request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RescheduleAppointment {
    /// New date (YYYY-MM-DD)
    #[validate(length(min = 1, message = "date is required"))]
    pub date: String,
    /// New start time (HH:MM)
    #[validate(length(min = 1, message = "start_time is required"))]
    pub start_time: String,
}

/// Query parameters for the availability endpoint
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub staff_id: Uuid,
    pub service_id: Uuid,
    /// Date (YYYY-MM-DD)
    pub date: String,
}

/// Successful booking: the appointment and its pending payment
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingConfirmation {
    pub appointment: Appointment,
    pub payment: Payment,
}
