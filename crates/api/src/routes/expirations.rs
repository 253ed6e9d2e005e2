//! Grave lease expiration alerts.

use axum::{extract::State, Json};
use chrono::{Duration, Utc};

use domain::models::expiration::{ExpirationAlert, ExpirationQuery};
use persistence::repositories::GraveRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidatedQuery;

/// Graves already expired or expiring within `withinDays` (default from
/// `limits.expiration_window_days`), soonest first.
///
/// GET /api/v1/admin/expirations
pub async fn list_expirations(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ExpirationQuery>,
) -> Result<Json<Vec<ExpirationAlert>>, ApiError> {
    let window = query
        .within_days
        .unwrap_or(state.config.limits.expiration_window_days);
    let today = Utc::now().date_naive();
    let cutoff = today + Duration::days(window);

    let alerts = GraveRepository::new(state.pool.clone())
        .list_expiring_before(cutoff)
        .await?
        .iter()
        .filter_map(|grave| grave.expiration_alert(today, window))
        .collect();
    Ok(Json(alerts))
}
