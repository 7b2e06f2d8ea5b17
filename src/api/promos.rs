//! Promo code endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::promo::{PromoValidation, PromoValidationQuery},
    AppState,
};

/// Check whether a promo code currently applies to a salon
#[utoipa::path(
    get,
    path = "/promos/validate",
    tag = "promos",
    params(PromoValidationQuery),
    responses(
        (status = 200, description = "Validation result", body = PromoValidation),
        (status = 400, description = "Missing code", body = crate::error::ErrorResponse)
    )
)]
pub async fn validate_promo(
    State(state): State<AppState>,
    Query(query): Query<PromoValidationQuery>,
) -> AppResult<Json<PromoValidation>> {
    let result = state
        .services
        .promos
        .validate(&query.code, query.salon_id)
        .await?;
    Ok(Json(result))
}
