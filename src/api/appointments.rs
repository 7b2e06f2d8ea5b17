//! Appointment endpoints: availability, booking and lifecycle

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        appointment::{
            Appointment, AvailabilityQuery, BookAppointment, BookingConfirmation,
            RescheduleAppointment,
        },
        TimeSlot,
    },
    AppState,
};

use super::AuthenticatedUser;

/// List candidate slots for a staff member, service and date
#[utoipa::path(
    get,
    path = "/appointments/available-slots",
    tag = "appointments",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Slots in chronological order", body = Vec<TimeSlot>),
        (status = 400, description = "Malformed date", body = crate::error::ErrorResponse),
        (status = 404, description = "Service not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn available_slots(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Vec<TimeSlot>>> {
    let slots = state
        .services
        .availability
        .available_slots(query.staff_id, query.service_id, &query.date)
        .await?;
    Ok(Json(slots))
}

/// Book an appointment for the authenticated customer
#[utoipa::path(
    post,
    path = "/appointments",
    tag = "appointments",
    security(("bearer_auth" = [])),
    request_body = BookAppointment,
    responses(
        (status = 201, description = "Appointment confirmed", body = BookingConfirmation),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 404, description = "Service or staff not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Staff unavailable or slot already booked", body = crate::error::ErrorResponse),
        (status = 422, description = "Promo code not applicable", body = crate::error::ErrorResponse),
        (status = 503, description = "Calendar busy, retry", body = crate::error::ErrorResponse)
    )
)]
pub async fn book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BookAppointment>,
) -> AppResult<(StatusCode, Json<BookingConfirmation>)> {
    let confirmation = state
        .services
        .booking
        .book(claims.user_id(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

/// Appointments of the authenticated customer, newest first
#[utoipa::path(
    get,
    path = "/appointments/mine",
    tag = "appointments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Customer appointments", body = Vec<Appointment>)
    )
)]
pub async fn my_appointments(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Appointment>>> {
    let appointments = state
        .services
        .appointments
        .list_for_customer(claims.user_id())
        .await?;
    Ok(Json(appointments))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment", body = Appointment),
        (status = 404, description = "Appointment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appointment = state.services.appointments.get(&claims, id).await?;
    Ok(Json(appointment))
}

/// Move an appointment to another date or time
#[utoipa::path(
    put,
    path = "/appointments/{id}/reschedule",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = RescheduleAppointment,
    responses(
        (status = 200, description = "Appointment rescheduled", body = Appointment),
        (status = 400, description = "Invalid request or appointment closed", body = crate::error::ErrorResponse),
        (status = 404, description = "Appointment not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Slot already booked", body = crate::error::ErrorResponse)
    )
)]
pub async fn reschedule(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RescheduleAppointment>,
) -> AppResult<Json<Appointment>> {
    let appointment = state
        .services
        .booking
        .reschedule(claims.user_id(), id, request)
        .await?;
    Ok(Json(appointment))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment cancelled, payment refunded", body = Appointment),
        (status = 400, description = "Appointment already closed", body = crate::error::ErrorResponse),
        (status = 404, description = "Appointment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appointment = state.services.appointments.cancel(&claims, id).await?;
    Ok(Json(appointment))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/complete",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment completed", body = Appointment),
        (status = 403, description = "Salon owner or admin only", body = crate::error::ErrorResponse)
    )
)]
pub async fn complete(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appointment = state.services.appointments.complete(&claims, id).await?;
    Ok(Json(appointment))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/no-show",
    tag = "appointments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment marked as no-show", body = Appointment),
        (status = 403, description = "Salon owner or admin only", body = crate::error::ErrorResponse)
    )
)]
pub async fn no_show(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appointment = state.services.appointments.mark_no_show(&claims, id).await?;
    Ok(Json(appointment))
}
