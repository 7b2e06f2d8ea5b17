//! Promo code redemption and advisory validation

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::promo::{PromoRedemption, PromoValidation},
    repository::{CalendarTx, Repository},
};

/// Lock, check and consume one use of `code` inside an open booking
/// transaction. The increment is rolled back with the transaction.
pub async fn redeem(
    tx: &mut dyn CalendarTx,
    code: &str,
    salon_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<PromoRedemption> {
    let promo = tx
        .lock_promo(salon_id, code)
        .await?
        .ok_or_else(|| AppError::PromoIneligible("invalid promo code".to_string()))?;

    promo
        .check_eligibility(salon_id, now)
        .map_err(|reason| AppError::PromoIneligible(reason.message().to_string()))?;

    tx.increment_promo_usage(promo.id).await?;
    tracing::debug!(promo_id = %promo.id, used = promo.used_count + 1, "promo code redeemed");

    Ok(PromoRedemption {
        promo_id: promo.id,
        discount_percent: promo.discount_percent,
    })
}

#[derive(Clone)]
pub struct PromoService {
    repository: Repository,
}

impl PromoService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check a code without reserving it. A later booking may still be
    /// refused if the last use is taken in between.
    pub async fn validate(&self, code: &str, salon_id: Uuid) -> AppResult<PromoValidation> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::Validation("code is required".to_string()));
        }

        let validation = match self.repository.get_promo(salon_id, code).await? {
            None => PromoValidation {
                valid: false,
                code: code.to_string(),
                discount_percent: None,
                reason: Some("invalid promo code".to_string()),
            },
            Some(promo) => match promo.check_eligibility(salon_id, Utc::now()) {
                Ok(()) => PromoValidation {
                    valid: true,
                    code: promo.code,
                    discount_percent: Some(promo.discount_percent),
                    reason: None,
                },
                Err(reason) => PromoValidation {
                    valid: false,
                    code: promo.code,
                    discount_percent: None,
                    reason: Some(reason.message().to_string()),
                },
            },
        };
        Ok(validation)
    }
}
