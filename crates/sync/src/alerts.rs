//! Standing price alerts: creation, lifecycle, and the evaluation sweep.

use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use cardvault_core::alerts::{percent_change, should_trigger};
use cardvault_core::grading::validate_grade_key;
use cardvault_core::types::DbId;
use cardvault_db::models::alert::{ActiveAlert, CreateAlert, PriceAlert};
use cardvault_db::models::notification::EnqueueNotification;
use cardvault_db::repositories::{AlertRepo, CardRepo, NotificationRepo, PriceSnapshotRepo};

use crate::error::SyncError;
use crate::MAX_REPORTED_ERRORS;

/// Counts returned by one alert sweep.
#[derive(Debug, Clone, Serialize)]
pub struct AlertCheckOutcome {
    pub checked: usize,
    pub triggered: usize,
    /// At most [`MAX_REPORTED_ERRORS`] messages; per-alert failures never
    /// stop the sweep.
    pub errors: Vec<String>,
}

/// Evaluates and manages user price alerts.
pub struct AlertEngine {
    pool: PgPool,
}

impl AlertEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Evaluate every active alert against its card's current snapshot.
    ///
    /// Alerts without a current price or a baseline are skipped, not
    /// errored. A firing alert enqueues exactly one notification, then
    /// has its baseline reset to the firing price so the same absolute
    /// move cannot fire again.
    pub async fn check_all_alerts(&self) -> Result<AlertCheckOutcome, SyncError> {
        let alerts = AlertRepo::active_with_prices(&self.pool).await?;
        let mut outcome = AlertCheckOutcome {
            checked: 0,
            triggered: 0,
            errors: Vec::new(),
        };

        for alert in &alerts {
            outcome.checked += 1;
            match self.check_one(alert).await {
                Ok(true) => outcome.triggered += 1,
                Ok(false) => {}
                Err(e) => {
                    if outcome.errors.len() < MAX_REPORTED_ERRORS {
                        outcome.errors.push(format!("alert {}: {e}", alert.id));
                    }
                    tracing::warn!(alert_id = alert.id, error = %e, "alert check failed; continuing");
                }
            }
        }

        tracing::info!(
            checked = outcome.checked,
            triggered = outcome.triggered,
            "alert sweep finished"
        );
        Ok(outcome)
    }

    /// Create an alert. The baseline is seeded from the price the alert
    /// watches (near-mint for raw, the graded average otherwise); a card
    /// with no snapshot yet leaves the baseline unset and the alert
    /// dormant until the first price arrives.
    pub async fn create_alert(&self, input: &CreateAlert) -> Result<PriceAlert, SyncError> {
        input
            .validate()
            .map_err(|e| SyncError::InvalidInput(e.to_string()))?;
        let grade_key = validate_grade_key(&input.grade_key)
            .map_err(|e| SyncError::InvalidInput(e.to_string()))?;

        CardRepo::find_by_id(&self.pool, input.card_id)
            .await?
            .ok_or(SyncError::UnknownCard(input.card_id))?;

        let baseline = PriceSnapshotRepo::find_by_card(&self.pool, input.card_id)
            .await?
            .and_then(|snapshot| snapshot.price_for(input.grading_company, &grade_key));

        let alert = AlertRepo::create(&self.pool, input, &grade_key, baseline).await?;
        tracing::info!(alert_id = alert.id, card_id = alert.card_id, "alert created");
        Ok(alert)
    }

    /// Flip an alert's active flag.
    pub async fn toggle_alert(&self, id: DbId) -> Result<PriceAlert, SyncError> {
        AlertRepo::toggle(&self.pool, id)
            .await?
            .ok_or(SyncError::UnknownAlert(id))
    }

    /// Hard-delete an alert, scoped to its owner.
    pub async fn delete_alert(&self, id: DbId, user_id: DbId) -> Result<bool, SyncError> {
        Ok(AlertRepo::delete(&self.pool, id, user_id).await?)
    }

    // ---- private helpers ----

    /// Evaluate one alert; returns whether it fired.
    async fn check_one(&self, alert: &ActiveAlert) -> Result<bool, SyncError> {
        let Some(current) = alert.current_price() else {
            return Ok(false);
        };
        let Some(baseline) = alert.baseline_price else {
            // First price this alert has ever seen: seed the baseline so
            // the next sweep has a reference, but do not fire on it.
            AlertRepo::seed_baseline(&self.pool, alert.id, current).await?;
            return Ok(false);
        };

        let change = percent_change(baseline, current);
        if !should_trigger(change, alert.threshold_percent, alert.direction()) {
            return Ok(false);
        }

        NotificationRepo::enqueue(
            &self.pool,
            &EnqueueNotification {
                user_id: alert.user_id,
                alert_id: Some(alert.id),
                card_id: Some(alert.card_id),
                delivery_method: alert.delivery_method.clone(),
                subject: format!("Price alert: {}", alert.card_name),
                body: format!(
                    "{} ({}) moved {:+.1}%: ${:.2} -> ${:.2}",
                    alert.card_name, alert.grade_key, change, baseline, current
                ),
            },
        )
        .await?;
        AlertRepo::mark_triggered(&self.pool, alert.id, current).await?;
        tracing::info!(
            alert_id = alert.id,
            card_id = alert.card_id,
            change_percent = change,
            "alert triggered"
        );
        Ok(true)
    }
}
