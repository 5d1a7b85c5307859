use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

use super::dto::{
    CreateHabitRequest, CreatedHabitResponse, HabitPatch, HabitResponse, MarkDoneResponse,
    MessageResponse,
};
use super::services;

pub fn habit_routes() -> Router<AppState> {
    Router::new()
        .route("/habits", get(list_habits).post(create_habit))
        .route("/habits/:id", put(update_habit).delete(delete_habit))
        .route("/habits/:id/done", put(mark_done))
}

#[instrument(skip(state, body))]
pub async fn create_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(body): ApiJson<CreateHabitRequest>,
) -> Result<Json<CreatedHabitResponse>, AppError> {
    let id = services::create_habit(state.store.as_ref(), user_id, &body.name).await?;
    Ok(Json(CreatedHabitResponse { id }))
}

#[instrument(skip(state))]
pub async fn list_habits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<HabitResponse>>, AppError> {
    let habits = services::list_habits(state.store.as_ref(), user_id).await?;
    let items = habits
        .into_iter()
        .map(HabitResponse::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(anyhow::Error::from)?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn mark_done(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MarkDoneResponse>, AppError> {
    let streak = services::mark_done(state.store.as_ref(), id, user_id).await?;
    Ok(Json(MarkDoneResponse {
        message: "Habit marked as done",
        streak,
    }))
}

#[instrument(skip(state, patch))]
pub async fn update_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<HabitPatch>,
) -> Result<Json<MessageResponse>, AppError> {
    services::rename_habit(state.store.as_ref(), id, user_id, patch).await?;
    Ok(Json(MessageResponse {
        message: "Habit updated successfully",
    }))
}

#[instrument(skip(state))]
pub async fn delete_habit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_habit(state.store.as_ref(), id, user_id).await?;
    Ok(Json(MessageResponse {
        message: "Habit deleted successfully",
    }))
}
