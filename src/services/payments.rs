//! Settlement of the payment recorded at booking time

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        payment::{Payment, ProcessPayment},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
}

impl PaymentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Mark the booking's payment as paid with the given method
    pub async fn process(&self, actor: &UserClaims, request: ProcessPayment) -> AppResult<Payment> {
        self.check_access(actor, request.appointment_id).await?;
        let payment = self
            .repository
            .complete_payment(request.appointment_id, request.method)
            .await?;
        tracing::info!(
            appointment_id = %request.appointment_id,
            method = request.method.as_str(),
            receipt = %payment.receipt_number,
            "payment processed"
        );
        Ok(payment)
    }

    pub async fn receipt(&self, actor: &UserClaims, appointment_id: Uuid) -> AppResult<Payment> {
        self.check_access(actor, appointment_id).await?;
        self.repository
            .get_payment(appointment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Payment for appointment {} not found", appointment_id))
            })
    }

    async fn check_access(&self, actor: &UserClaims, appointment_id: Uuid) -> AppResult<()> {
        self.repository
            .get_appointment(appointment_id)
            .await?
            .filter(|a| actor.is_salon_staff() || a.customer_id == actor.user_id())
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", appointment_id)))
    }
}
