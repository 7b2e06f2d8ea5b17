//! Payment model and charge computation

use chrono::{DateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Sales tax applied on the discounted amount (8%)
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Cash,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

/// Payment model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub amount: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub method: String,
    pub status: PaymentStatus,
    pub receipt_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment row about to be inserted by the booking transaction
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub charge: Charge,
    pub method: PaymentMethod,
    pub receipt_number: String,
}

/// Process payment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessPayment {
    pub appointment_id: Uuid,
    pub method: PaymentMethod,
}

/// Amounts derived from a service price and an optional promo discount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
    pub amount: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl Charge {
    pub fn compute(price: Decimal, discount_percent: Option<Decimal>) -> Self {
        let discount = discount_percent
            .map(|pct| cents(price * pct / Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO);
        let taxable = price - discount;
        let tax = cents(taxable * TAX_RATE);
        Self {
            amount: price,
            discount,
            tax,
            total: taxable + tax,
        }
    }
}

/// Loyalty points earned for a service: one per whole currency unit
pub fn loyalty_points(price: Decimal) -> i32 {
    price.floor().to_i32().unwrap_or(0).max(0)
}

/// Receipt number built from the creation instant and the appointment id
pub fn receipt_number(now: DateTime<Utc>, appointment_id: Uuid) -> String {
    let id = appointment_id.simple().to_string();
    format!("RCP-{}-{}", now.format("%Y%m%d%H%M%S"), &id[..8])
}
