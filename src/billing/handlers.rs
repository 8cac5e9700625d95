use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::account::jwt::AuthUser;
use crate::billing::{
    dto::{ConfirmRequest, ConfirmResponse, PurchaseRequest, PurchaseResponse},
    services,
};
use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/pay", post(pay))
        .route("/verify", post(verify))
}

#[instrument(skip(state, payload))]
pub async fn pay(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let order = services::initiate_purchase(
        state.store.as_ref(),
        state.gateway.as_ref(),
        &state.config.currency,
        user_id,
        &payload.plan_id,
    )
    .await?;
    Ok(Json(PurchaseResponse {
        success: true,
        order,
    }))
}

/// No auth guard here: the request authenticates itself through the
/// gateway-signed payload.
#[instrument(skip(state, payload))]
pub async fn verify(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let (credits, credited) = services::confirm_purchase(
        state.store.as_ref(),
        state.gateway.as_ref(),
        &state.config.gateway.key_secret,
        &payload,
    )
    .await?;
    let message = if credited {
        "Credits Added"
    } else {
        "Already credited"
    };
    Ok(Json(ConfirmResponse {
        success: true,
        message: message.into(),
        credits,
    }))
}
