use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::{ValidatedJson, run_blocking};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};
use shared::models::Order;
use shared::request::UpdateStatusRequest;

/// POST /api/scan/{riderToken}
pub async fn scan(
    State(state): State<ServerState>,
    Path(rider_token): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let riders = state.riders.clone();
    let order =
        run_blocking(move || riders.scan_transition(&rider_token, payload.new_status)).await?;
    Ok(ok(order))
}
