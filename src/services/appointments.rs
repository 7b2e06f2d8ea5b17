//! Appointment lookup and status transitions after booking

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        appointment::{Appointment, AppointmentStatus},
        payment::PaymentStatus,
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct AppointmentsService {
    repository: Repository,
}

impl AppointmentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Fetch an appointment visible to `actor`. Customers only see their own;
    /// anything else is reported as missing.
    pub async fn get(&self, actor: &UserClaims, id: Uuid) -> AppResult<Appointment> {
        self.repository
            .get_appointment(id)
            .await?
            .filter(|a| actor.is_salon_staff() || a.customer_id == actor.user_id())
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))
    }

    pub async fn list_for_customer(&self, customer_id: Uuid) -> AppResult<Vec<Appointment>> {
        self.repository.list_customer_appointments(customer_id).await
    }

    /// Cancel and refund. Frees the slot for new bookings.
    pub async fn cancel(&self, actor: &UserClaims, id: Uuid) -> AppResult<Appointment> {
        self.get(actor, id).await?;
        let appointment = self
            .repository
            .transition_appointment(id, AppointmentStatus::Cancelled, Some(PaymentStatus::Refunded))
            .await?;
        tracing::info!(appointment_id = %id, by = %actor.user_id(), "appointment cancelled");
        Ok(appointment)
    }

    pub async fn complete(&self, actor: &UserClaims, id: Uuid) -> AppResult<Appointment> {
        actor.require_salon_staff()?;
        let appointment = self
            .repository
            .transition_appointment(id, AppointmentStatus::Completed, Some(PaymentStatus::Completed))
            .await?;
        tracing::info!(appointment_id = %id, "appointment completed");
        Ok(appointment)
    }

    pub async fn mark_no_show(&self, actor: &UserClaims, id: Uuid) -> AppResult<Appointment> {
        actor.require_salon_staff()?;
        let appointment = self
            .repository
            .transition_appointment(id, AppointmentStatus::NoShow, None)
            .await?;
        tracing::info!(appointment_id = %id, "appointment marked as no-show");
        Ok(appointment)
    }
}
