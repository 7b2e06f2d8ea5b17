//! Promo code model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PromoCode {
    pub id: Uuid,
    pub salon_id: Uuid,
    /// Unique per salon
    pub code: String,
    pub discount_percent: Decimal,
    pub valid_from: DateTime<Utc>,
    /// `None` means open-ended
    pub valid_until: Option<DateTime<Utc>>,
    /// `None` means unlimited
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
}

/// Reasons a promo code cannot be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    WrongSalon,
    Inactive,
    NotYetValid,
    Expired,
    Exhausted,
}

impl Ineligibility {
    pub fn message(self) -> &'static str {
        match self {
            Ineligibility::WrongSalon => "promo code does not belong to this salon",
            Ineligibility::Inactive => "promo code is no longer active",
            Ineligibility::NotYetValid => "promo code is not valid yet",
            Ineligibility::Expired => "promo code has expired",
            Ineligibility::Exhausted => "promo code has reached maximum uses",
        }
    }
}

impl PromoCode {
    /// Check whether the code can be redeemed for `salon_id` at `now`
    pub fn check_eligibility(&self, salon_id: Uuid, now: DateTime<Utc>) -> Result<(), Ineligibility> {
        if self.salon_id != salon_id {
            return Err(Ineligibility::WrongSalon);
        }
        if !self.is_active {
            return Err(Ineligibility::Inactive);
        }
        if self.valid_from > now {
            return Err(Ineligibility::NotYetValid);
        }
        if self.valid_until.is_some_and(|until| until <= now) {
            return Err(Ineligibility::Expired);
        }
        if self.max_uses.is_some_and(|max| self.used_count >= max) {
            return Err(Ineligibility::Exhausted);
        }
        Ok(())
    }
}

/// Outcome of a successful redemption inside the booking transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromoRedemption {
    pub promo_id: Uuid,
    pub discount_percent: Decimal,
}

/// Query parameters for promo validation
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PromoValidationQuery {
    pub code: String,
    pub salon_id: Uuid,
}

/// Advisory validation result (no redemption happens)
#[derive(Debug, Serialize, ToSchema)]
pub struct PromoValidation {
    pub valid: bool,
    pub code: String,
    pub discount_percent: Option<Decimal>,
    pub reason: Option<String>,
}
