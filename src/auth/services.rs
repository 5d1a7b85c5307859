use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::{
    dto::{LoginRequest, SignupRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::error::AppError;
use crate::store::Store;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registers a user and returns its id.
#[instrument(skip(store, input), fields(email = %input.email))]
pub async fn signup(store: &dyn Store, input: SignupRequest) -> Result<Uuid, AppError> {
    let email = normalize_email(&input.email);
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    let username = input.username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    if input.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict);
    }

    let hash = hash_password(&input.password)?;

    // The unique index still catches a signup racing this one.
    let user = store
        .insert_user(username, &email, &hash)
        .await?
        .ok_or(AppError::Conflict)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user.id)
}

/// Verifies credentials and issues an access token.
#[instrument(skip(store, keys, input), fields(email = %input.email))]
pub async fn login(
    store: &dyn Store,
    keys: &JwtKeys,
    input: LoginRequest,
) -> Result<String, AppError> {
    let email = normalize_email(&input.email);

    let Some(user) = store.find_user_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials"));
    };

    if !verify_password(&input.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    let token = keys.sign(user.id, &user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}
