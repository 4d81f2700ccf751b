//! Price alert models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use cardvault_core::alerts::AlertDirection;
use cardvault_core::grading::GradingCompany;
use cardvault_core::types::{DbId, Timestamp};

/// A row from the `price_alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceAlert {
    pub id: DbId,
    pub user_id: DbId,
    pub card_id: DbId,
    pub grading_company: String,
    pub grade_key: String,
    pub threshold_percent: f64,
    pub direction: String,
    /// Moving reference price; reset to the firing price on every trigger.
    pub baseline_price: Option<f64>,
    pub is_active: bool,
    pub delivery_method: String,
    pub last_triggered_at: Option<Timestamp>,
    pub trigger_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PriceAlert {
    /// Typed view of the stored direction string.
    pub fn direction(&self) -> AlertDirection {
        AlertDirection::from_str(&self.direction)
    }

    /// Typed view of the stored grading company string.
    pub fn company(&self) -> GradingCompany {
        GradingCompany::from_str(&self.grading_company)
    }
}

/// DTO for creating an alert. The baseline is not part of the request:
/// it is seeded from the best currently-known price at creation time.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAlert {
    pub user_id: DbId,
    pub card_id: DbId,
    pub grading_company: GradingCompany,
    /// Raw grade key as typed by the user; normalized before storage.
    pub grade_key: String,
    #[validate(range(min = 1.0, max = 500.0))]
    pub threshold_percent: f64,
    pub direction: AlertDirection,
    /// Defaults to email when omitted.
    pub delivery_method: Option<String>,
}

/// One active alert joined with its card's current snapshot fields.
/// Snapshot columns are null when the card has no snapshot yet.
#[derive(Debug, Clone, FromRow)]
pub struct ActiveAlert {
    pub id: DbId,
    pub user_id: DbId,
    pub card_id: DbId,
    pub card_name: String,
    pub grading_company: String,
    pub grade_key: String,
    pub threshold_percent: f64,
    pub direction: String,
    pub baseline_price: Option<f64>,
    pub delivery_method: String,
    pub near_mint: Option<f64>,
    pub graded: Option<serde_json::Value>,
}

impl ActiveAlert {
    /// Typed view of the stored direction string.
    pub fn direction(&self) -> AlertDirection {
        AlertDirection::from_str(&self.direction)
    }

    /// Resolve the current price this alert watches: near-mint for raw,
    /// otherwise the matching graded average from the joined snapshot.
    pub fn current_price(&self) -> Option<f64> {
        if GradingCompany::from_str(&self.grading_company) == GradingCompany::Raw {
            return self.near_mint;
        }
        let graded = self.graded.as_ref()?;
        graded
            .get(&self.grade_key)?
            .get("average")
            .and_then(|v| v.as_f64())
    }
}
