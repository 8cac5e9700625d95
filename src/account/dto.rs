use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client. Never carries the
/// password hash or balance unless the endpoint is about the balance.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub name: String,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: PublicUser,
}

/// Response for the balance query.
#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub success: bool,
    pub credits: i32,
    pub user: PublicUser,
}
