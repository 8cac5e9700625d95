use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::account::jwt::AuthUser;
use crate::error::{ApiError, ApiJson};
use crate::images::{
    dto::{GenerateRequest, GenerateResponse},
    services,
};
use crate::state::AppState;

pub fn image_routes() -> Router<AppState> {
    Router::new().route("/generate-image", post(generate_image))
}

#[instrument(skip(state, payload))]
pub async fn generate_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let out = services::generate_image(
        state.store.as_ref(),
        state.synthesizer.as_ref(),
        user_id,
        &payload.prompt,
    )
    .await?;
    Ok(Json(GenerateResponse {
        success: true,
        message: "Image Generated".into(),
        credit_balance: out.credit_balance,
        result_image: out.data_url,
    }))
}
