use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, SignupRequest, SignupResponse, TokenResponse},
        jwt::JwtKeys,
        services,
    },
    error::AppError,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    services::signup(state.store.as_ref(), payload).await?;
    Ok(Json(SignupResponse {
        message: "User created",
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let token = services::login(state.store.as_ref(), &keys, payload).await?;
    Ok(Json(TokenResponse::bearer(token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_serialization() {
        let json = serde_json::to_value(TokenResponse::bearer("abc".into())).unwrap();
        assert_eq!(json["access_token"], "abc");
        assert_eq!(json["token_type"], "bearer");
    }
}
