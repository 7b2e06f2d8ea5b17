//! Payment endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::payment::{Payment, ProcessPayment},
    AppState,
};

use super::AuthenticatedUser;

/// Settle the payment recorded for an appointment
#[utoipa::path(
    post,
    path = "/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    request_body = ProcessPayment,
    responses(
        (status = 200, description = "Payment completed", body = Payment),
        (status = 400, description = "Payment already refunded", body = crate::error::ErrorResponse),
        (status = 404, description = "Appointment or payment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn process_payment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ProcessPayment>,
) -> AppResult<Json<Payment>> {
    let payment = state.services.payments.process(&claims, request).await?;
    Ok(Json(payment))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}/payment",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Payment receipt", body = Payment),
        (status = 404, description = "Appointment or payment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_receipt(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(appointment_id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    let payment = state
        .services
        .payments
        .receipt(&claims, appointment_id)
        .await?;
    Ok(Json(payment))
}
