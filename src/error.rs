use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{error, warn};

/// Business and infrastructure failures surfaced by services.
///
/// Every variant is converted to the uniform `{ success, message }` envelope
/// at the handler boundary; the client never sees internal detail.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Conflict(String),
    #[error("No Credit Balance")]
    InsufficientCredit { balance: i32 },
    #[error("{0}")]
    Upstream(String),
    #[error("storage failure: {0}")]
    Persistence(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Business failures ride the envelope on 200; only the message tells
        // the client what went wrong.
        let body = match &self {
            ApiError::InsufficientCredit { balance } => json!({
                "success": false,
                "message": self.to_string(),
                "creditBalance": balance,
            }),
            ApiError::Persistence(detail) => {
                error!(error = %detail, "persistence failure");
                json!({ "success": false, "message": "Something went wrong" })
            }
            ApiError::Internal(err) => {
                error!(error = %err, "unhandled error");
                json!({ "success": false, "message": "Something went wrong" })
            }
            _ => json!({ "success": false, "message": self.to_string() }),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejection speaks the envelope.
///
/// A body with a missing or malformed field would otherwise surface axum's
/// plain-text 422 before any service-level validation runs.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                warn!(error = %rejection, "request body rejected");
                Err(ApiError::validation("Missing Details"))
            }
        }
    }
}
