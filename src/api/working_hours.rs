//! Staff working hours endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::staff::{ReplaceWorkingHours, StaffWorkingHours},
    AppState,
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/staff/{id}/working-hours",
    tag = "staff",
    params(("id" = Uuid, Path, description = "Staff ID")),
    responses(
        (status = 200, description = "Weekly schedule ordered by weekday", body = Vec<StaffWorkingHours>)
    )
)]
pub async fn list_working_hours(
    State(state): State<AppState>,
    Path(staff_id): Path<Uuid>,
) -> AppResult<Json<Vec<StaffWorkingHours>>> {
    let hours = state.services.working_hours.list(staff_id).await?;
    Ok(Json(hours))
}

/// Replace the weekly schedule of a staff member
#[utoipa::path(
    put,
    path = "/staff/{id}/working-hours",
    tag = "staff",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Staff ID")),
    request_body = ReplaceWorkingHours,
    responses(
        (status = 200, description = "Schedule replaced", body = Vec<StaffWorkingHours>),
        (status = 400, description = "Invalid schedule", body = crate::error::ErrorResponse),
        (status = 403, description = "Salon owner or admin only", body = crate::error::ErrorResponse),
        (status = 404, description = "Staff not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn replace_working_hours(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(staff_id): Path<Uuid>,
    Json(request): Json<ReplaceWorkingHours>,
) -> AppResult<Json<Vec<StaffWorkingHours>>> {
    claims.require_salon_staff()?;

    let hours = state
        .services
        .working_hours
        .replace(staff_id, request.hours)
        .await?;
    Ok(Json(hours))
}

/// Seed the default week for a newly created staff member
#[utoipa::path(
    post,
    path = "/staff/{id}/working-hours/defaults",
    tag = "staff",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Staff ID")),
    responses(
        (status = 201, description = "Default schedule created", body = Vec<StaffWorkingHours>),
        (status = 403, description = "Salon owner or admin only", body = crate::error::ErrorResponse)
    )
)]
pub async fn seed_default_hours(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(staff_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Vec<StaffWorkingHours>>)> {
    claims.require_salon_staff()?;

    let hours = state.services.working_hours.seed_defaults(staff_id).await?;
    Ok((StatusCode::CREATED, Json(hours)))
}
