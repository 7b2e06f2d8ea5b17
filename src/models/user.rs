//! Authenticated user claims (tokens are issued by the external auth service)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    SalonOwner,
    Admin,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
}

impl UserClaims {
    /// Create a JWT token (used by tests and local tooling)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    pub fn is_salon_staff(&self) -> bool {
        matches!(self.role, Role::SalonOwner | Role::Admin)
    }

    /// Require salon owner or admin privileges
    pub fn require_salon_staff(&self) -> Result<(), AppError> {
        if self.is_salon_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Salon owner or administrator privileges required".to_string(),
            ))
        }
    }
}
