//! Booking transaction: validation, staff calendar lock, conflict check,
//! promo redemption and the writes that make up a confirmed appointment.
//!
//! A booking moves through `validating -> checking_staff -> locking_calendar
//! -> checking_conflicts -> redeeming_promo -> persisting -> committed`. Any
//! error before commit drops the calendar transaction and with it every write
//! of the attempt.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use super::{
    parse_date, parse_time, promos,
    slots::{find_conflict, interval_from},
    working_hours::WorkingHoursService,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        appointment::{
            Appointment, AppointmentStatus, BookAppointment, BookingConfirmation, NewAppointment,
            RescheduleAppointment,
        },
        notification::{NewNotification, KIND_APPOINTMENT_CONFIRMED},
        payment::{self, Charge, NewPayment, PaymentMethod},
        slot::TimeRange,
        Service,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BookingService {
    repository: Repository,
    working_hours: WorkingHoursService,
    lock_timeout: Duration,
}

impl BookingService {
    pub fn new(repository: Repository, working_hours: WorkingHoursService, lock_timeout: Duration) -> Self {
        Self {
            repository,
            working_hours,
            lock_timeout,
        }
    }

    /// Book an appointment for `customer_id`
    pub async fn book(
        &self,
        customer_id: Uuid,
        request: BookAppointment,
    ) -> AppResult<BookingConfirmation> {
        let result = self.try_book(customer_id, &request).await;
        match &result {
            Ok(confirmation) => tracing::info!(
                appointment_id = %confirmation.appointment.id,
                staff_id = %request.staff_id,
                receipt = %confirmation.payment.receipt_number,
                "appointment booked"
            ),
            Err(e) => tracing::debug!(state = "aborted", staff_id = %request.staff_id, error = %e),
        }
        result
    }

    async fn try_book(
        &self,
        customer_id: Uuid,
        request: &BookAppointment,
    ) -> AppResult<BookingConfirmation> {
        tracing::debug!(state = "validating", %customer_id, staff_id = %request.staff_id);
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let service = self.bookable_service(request.service_id).await?;
        if service.salon_id != request.salon_id {
            return Err(AppError::Validation(
                "service does not belong to this salon".to_string(),
            ));
        }
        let date = parse_date(&request.date)?;
        let requested = interval_from(parse_time(&request.start_time)?, service.duration_minutes)?;

        tracing::debug!(state = "checking_staff", %date);
        self.check_working_window(request.staff_id, date, &requested)
            .await?;

        tracing::debug!(state = "locking_calendar");
        let mut tx = self
            .repository
            .begin_calendar(request.staff_id, self.lock_timeout)
            .await?;

        tracing::debug!(state = "checking_conflicts");
        let existing = tx.active_appointments(date).await?;
        if let Some(conflict) = find_conflict(&requested, &existing) {
            tracing::debug!(conflicting = %conflict.id, "slot taken");
            return Err(AppError::AvailabilityConflict(
                "time slot is already booked".to_string(),
            ));
        }

        let now = Utc::now();
        let code = request
            .promo_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());
        let redemption = match code {
            Some(code) => {
                tracing::debug!(state = "redeeming_promo", code);
                Some(promos::redeem(&mut *tx, code, request.salon_id, now).await?)
            }
            None => None,
        };

        tracing::debug!(state = "persisting");
        let appointment = tx
            .insert_appointment(NewAppointment {
                id: Uuid::new_v4(),
                customer_id,
                salon_id: request.salon_id,
                staff_id: request.staff_id,
                service_id: service.id,
                appointment_date: date,
                start_time: requested.start,
                end_time: requested.end,
                status: AppointmentStatus::Confirmed,
                notes: request.notes.clone(),
                promo_code_id: redemption.map(|r| r.promo_id),
            })
            .await?;

        let payment = tx
            .insert_payment(NewPayment {
                id: Uuid::new_v4(),
                appointment_id: appointment.id,
                charge: Charge::compute(service.price, redemption.map(|r| r.discount_percent)),
                method: PaymentMethod::Card,
                receipt_number: payment::receipt_number(now, appointment.id),
            })
            .await?;

        tx.insert_notification(NewNotification {
            id: Uuid::new_v4(),
            user_id: customer_id,
            kind: KIND_APPOINTMENT_CONFIRMED,
            title: "Appointment Confirmed".to_string(),
            message: format!(
                "Your appointment for {} on {} at {} has been confirmed.",
                service.name,
                date.format("%Y-%m-%d"),
                requested.start.format("%H:%M")
            ),
            appointment_id: Some(appointment.id),
        })
        .await?;

        tx.credit_loyalty(customer_id, payment::loyalty_points(service.price))
            .await?;

        tx.commit().await?;
        tracing::debug!(state = "committed", appointment_id = %appointment.id);

        Ok(BookingConfirmation {
            appointment,
            payment,
        })
    }

    /// Move one of the customer's open appointments to a new date and time
    pub async fn reschedule(
        &self,
        customer_id: Uuid,
        appointment_id: Uuid,
        request: RescheduleAppointment,
    ) -> AppResult<Appointment> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let current = self
            .repository
            .get_appointment(appointment_id)
            .await?
            .filter(|a| a.customer_id == customer_id)
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", appointment_id)))?;

        if !current.status.is_open() {
            return Err(AppError::InvalidState(format!(
                "Cannot reschedule a {} appointment",
                current.status
            )));
        }

        let service = self
            .repository
            .get_service(current.service_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", current.service_id)))?;
        let date = parse_date(&request.date)?;
        let requested = interval_from(parse_time(&request.start_time)?, service.duration_minutes)?;

        self.check_working_window(current.staff_id, date, &requested)
            .await?;

        let mut tx = self
            .repository
            .begin_calendar(current.staff_id, self.lock_timeout)
            .await?;

        let others: Vec<Appointment> = tx
            .active_appointments(date)
            .await?
            .into_iter()
            .filter(|a| a.id != appointment_id)
            .collect();
        if find_conflict(&requested, &others).is_some() {
            return Err(AppError::AvailabilityConflict(
                "time slot is already booked".to_string(),
            ));
        }

        let moved = tx.move_appointment(appointment_id, date, requested).await?;
        tx.commit().await?;

        tracing::info!(%appointment_id, %date, start = %requested.start, "appointment rescheduled");
        Ok(moved)
    }

    async fn bookable_service(&self, service_id: Uuid) -> AppResult<Service> {
        self.repository
            .get_service(service_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", service_id)))
    }

    async fn check_working_window(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
        requested: &TimeRange,
    ) -> AppResult<()> {
        let window = self.working_hours.require_window(staff_id, date).await?;
        if !requested.within(&window) {
            return Err(AppError::AvailabilityConflict(
                "requested time is outside the staff member's working hours".to_string(),
            ));
        }
        Ok(())
    }
}
