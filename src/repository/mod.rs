//! Repository layer: the store contract of the reservation core and its
//! Postgres and in-memory implementations.

pub mod locks;
pub mod memory;
pub mod postgres;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        notification::{NewNotification, Notification},
        payment::{NewPayment, Payment, PaymentMethod, PaymentStatus},
        promo::PromoCode,
        service::Service,
        slot::TimeRange,
        staff::{StaffWorkingHours, WorkingDay},
    },
};

/// Shared handle on the configured store
pub type Repository = Arc<dyn BookingStore>;

/// Reads and single-statement writes of the reservation core, plus the entry
/// point of the booking transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Check that the store is reachable
    async fn ping(&self) -> AppResult<()>;

    async fn get_service(&self, id: Uuid) -> AppResult<Option<Service>>;

    async fn get_working_hours(
        &self,
        staff_id: Uuid,
        day_of_week: i16,
    ) -> AppResult<Option<StaffWorkingHours>>;

    async fn list_working_hours(&self, staff_id: Uuid) -> AppResult<Vec<StaffWorkingHours>>;

    /// Delete every row for the staff member and insert `hours`, atomically
    async fn replace_working_hours(
        &self,
        staff_id: Uuid,
        hours: Vec<WorkingDay>,
    ) -> AppResult<Vec<StaffWorkingHours>>;

    /// Appointments of the staff member on `date` whose status still occupies
    /// the calendar (not cancelled, not no-show), ordered by start time
    async fn active_appointments(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<Appointment>>;

    async fn get_appointment(&self, id: Uuid) -> AppResult<Option<Appointment>>;

    /// Newest first
    async fn list_customer_appointments(&self, customer_id: Uuid) -> AppResult<Vec<Appointment>>;

    /// Move a pending/confirmed appointment to `to`, updating its payment to
    /// `payment_status` in the same unit of work.
    async fn transition_appointment(
        &self,
        id: Uuid,
        to: AppointmentStatus,
        payment_status: Option<PaymentStatus>,
    ) -> AppResult<Appointment>;

    async fn get_payment(&self, appointment_id: Uuid) -> AppResult<Option<Payment>>;

    /// Mark the payment of an appointment as completed with `method`
    async fn complete_payment(
        &self,
        appointment_id: Uuid,
        method: PaymentMethod,
    ) -> AppResult<Payment>;

    async fn get_promo(&self, salon_id: Uuid, code: &str) -> AppResult<Option<PromoCode>>;

    /// Open a transaction holding the exclusive calendar lock of `staff_id`.
    /// Waits at most `lock_timeout` for a concurrent holder.
    async fn begin_calendar(
        &self,
        staff_id: Uuid,
        lock_timeout: Duration,
    ) -> AppResult<Box<dyn CalendarTx>>;
}

/// A unit of work serialized on one staff member's calendar. Dropping it
/// without calling [`CalendarTx::commit`] discards every write.
#[async_trait]
pub trait CalendarTx: Send {
    /// Calendar-occupying appointments of the locked staff member on `date`
    async fn active_appointments(&mut self, date: NaiveDate) -> AppResult<Vec<Appointment>>;

    /// Row-lock the promo code and return its current state
    async fn lock_promo(&mut self, salon_id: Uuid, code: &str) -> AppResult<Option<PromoCode>>;

    async fn increment_promo_usage(&mut self, promo_id: Uuid) -> AppResult<()>;

    async fn insert_appointment(&mut self, appointment: NewAppointment) -> AppResult<Appointment>;

    /// Move a pending/confirmed appointment of the locked staff member and
    /// mark it confirmed
    async fn move_appointment(
        &mut self,
        id: Uuid,
        date: NaiveDate,
        range: TimeRange,
    ) -> AppResult<Appointment>;

    async fn insert_payment(&mut self, payment: NewPayment) -> AppResult<Payment>;

    async fn insert_notification(&mut self, notification: NewNotification)
        -> AppResult<Notification>;

    async fn credit_loyalty(&mut self, customer_id: Uuid, points: i32) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
