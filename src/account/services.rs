use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::account::dto::{AuthResponse, CreditsResponse, LoginRequest, PublicUser, RegisterRequest};
use crate::account::jwt::JwtKeys;
use crate::account::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::store::Store;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub async fn register(
    store: &dyn Store,
    keys: &JwtKeys,
    mut req: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    req.email = req.email.trim().to_lowercase();

    if req.name.trim().is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Missing Details"));
    }
    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }

    let hash = hash_password(&req.password)?;
    let user = store.create_user(req.name.trim(), &req.email, &hash).await?;
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        success: true,
        token,
        user: PublicUser { name: user.name },
    })
}

pub async fn login(
    store: &dyn Store,
    keys: &JwtKeys,
    mut req: LoginRequest,
) -> Result<AuthResponse, ApiError> {
    req.email = req.email.trim().to_lowercase();

    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Missing Details"));
    }

    let user = store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User does not exist"))?;

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(email = %req.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::auth("Invalid Credentials"));
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResponse {
        success: true,
        token,
        user: PublicUser { name: user.name },
    })
}

pub async fn credits(store: &dyn Store, user_id: Uuid) -> Result<CreditsResponse, ApiError> {
    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(CreditsResponse {
        success: true,
        credits: user.credit_balance,
        user: PublicUser { name: user.name },
    })
}
