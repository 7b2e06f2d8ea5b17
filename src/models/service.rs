//! Salon service (haircut, colouring, ...) as read by the booking core

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Service {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub name: String,
    /// Length of the appointment in minutes
    pub duration_minutes: i32,
    /// Clean-up time after the service. Informational only: it does not widen
    /// the occupied interval used for conflict checks.
    pub buffer_minutes: i32,
    pub price: Decimal,
    pub is_active: bool,
}

impl Service {
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}
