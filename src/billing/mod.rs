use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod plans;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::billing_routes()
}
