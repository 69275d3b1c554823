//! JSON handlers for device monitor status.

use axum::Json;
use axum::extract::{Path, State};

use viamon_domain::error::ViamonError;
use viamon_domain::id::DeviceId;
use viamon_domain::session::SessionStatus;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/monitors`
pub async fn list(State(state): State<AppState>) -> Json<Vec<SessionStatus>> {
    Json(state.fleet.statuses())
}

/// `GET /api/monitors/{device_id}`
pub async fn get(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<SessionStatus>, ApiError> {
    let device_id = DeviceId::new(device_id).map_err(ViamonError::from)?;
    let status = state.fleet.status(&device_id)?;
    Ok(Json(status))
}
