//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{appointments, health, payments, promos, working_hours};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Salon Booking API",
        version = "1.0.0",
        description = "Appointment reservation core of the salon booking platform",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Appointments
        appointments::available_slots,
        appointments::book,
        appointments::my_appointments,
        appointments::get_appointment,
        appointments::reschedule,
        appointments::cancel,
        appointments::complete,
        appointments::no_show,
        // Payments
        payments::process_payment,
        payments::get_receipt,
        // Promos
        promos::validate_promo,
        // Staff
        working_hours::list_working_hours,
        working_hours::replace_working_hours,
        working_hours::seed_default_hours,
    ),
    components(
        schemas(
            // Appointments
            crate::models::appointment::Appointment,
            crate::models::appointment::AppointmentStatus,
            crate::models::appointment::BookAppointment,
            crate::models::appointment::RescheduleAppointment,
            crate::models::appointment::BookingConfirmation,
            crate::models::slot::TimeSlot,
            // Payments
            crate::models::payment::Payment,
            crate::models::payment::PaymentStatus,
            crate::models::payment::PaymentMethod,
            crate::models::payment::ProcessPayment,
            // Promos
            crate::models::promo::PromoValidation,
            // Staff
            crate::models::staff::StaffWorkingHours,
            crate::models::staff::WorkingDay,
            crate::models::staff::ReplaceWorkingHours,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ErrorKind,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "appointments", description = "Availability, booking and appointment lifecycle"),
        (name = "payments", description = "Booking payments and receipts"),
        (name = "promos", description = "Promo code validation"),
        (name = "staff", description = "Staff working hours")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
