//! API handlers for the salon booking REST endpoints

pub mod appointments;
pub mod health;
pub mod openapi;
pub mod payments;
pub mod promos;
pub mod working_hours;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        // Tokens are issued by the platform's auth service with a shared secret
        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Appointments
        .route(
            "/appointments/available-slots",
            get(appointments::available_slots),
        )
        .route("/appointments", post(appointments::book))
        .route("/appointments/mine", get(appointments::my_appointments))
        .route("/appointments/:id", get(appointments::get_appointment))
        .route(
            "/appointments/:id/reschedule",
            put(appointments::reschedule),
        )
        .route("/appointments/:id/cancel", post(appointments::cancel))
        .route("/appointments/:id/complete", post(appointments::complete))
        .route("/appointments/:id/no-show", post(appointments::no_show))
        // Payments
        .route("/payments", post(payments::process_payment))
        .route("/appointments/:id/payment", get(payments::get_receipt))
        // Promo codes
        .route("/promos/validate", get(promos::validate_promo))
        // Staff working hours
        .route(
            "/staff/:id/working-hours",
            get(working_hours::list_working_hours).put(working_hours::replace_working_hours),
        )
        .route(
            "/staff/:id/working-hours/defaults",
            post(working_hours::seed_default_hours),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
