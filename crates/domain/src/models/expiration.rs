//! Grave lease expiration alerts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Where a grave's expiration date falls relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpirationState {
    Expired,
    ExpiringSoon,
}

/// Classifies an expiration date.
///
/// Returns `None` when the date lies beyond the window. A date equal to
/// today is still expiring, not expired.
pub fn classify(
    expiration_date: NaiveDate,
    today: NaiveDate,
    window_days: i64,
) -> Option<(ExpirationState, i64)> {
    let days_remaining = (expiration_date - today).num_days();
    if days_remaining < 0 {
        Some((ExpirationState::Expired, days_remaining))
    } else if days_remaining <= window_days {
        Some((ExpirationState::ExpiringSoon, days_remaining))
    } else {
        None
    }
}

/// A grave whose lease has lapsed or lapses soon.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationAlert {
    pub grave_id: Uuid,
    pub cluster_id: Uuid,
    pub cluster_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_number: Option<String>,
    pub expiration_date: NaiveDate,
    pub days_remaining: i64,
    pub state: ExpirationState,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationQuery {
    #[validate(range(min = 0, max = 3650, message = "withinDays must be between 0 and 3650"))]
    pub within_days: Option<i64>,
}
