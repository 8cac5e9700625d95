use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::account::{
    dto::{AuthResponse, CreditsResponse, LoginRequest, RegisterRequest},
    jwt::{AuthUser, JwtKeys},
    services,
};
use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/credits", get(credits))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let out = services::register(state.store.as_ref(), &keys, payload).await?;
    Ok(Json(out))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let out = services::login(state.store.as_ref(), &keys, payload).await?;
    Ok(Json(out))
}

#[instrument(skip(state))]
pub async fn credits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CreditsResponse>, ApiError> {
    let out = services::credits(state.store.as_ref(), user_id).await?;
    Ok(Json(out))
}
