use time::{Date, OffsetDateTime};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::habits::dto::HabitPatch;
use crate::habits::repo_types::{Completion, Habit};
use crate::habits::streak::{next_streak, StreakError};
use crate::store::Store;

#[instrument(skip(store, name))]
pub async fn create_habit(store: &dyn Store, user_id: Uuid, name: &str) -> Result<Uuid, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Habit name is required".into()));
    }
    if store.find_user_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }

    let habit = store
        .insert_habit(user_id, name, OffsetDateTime::now_utc())
        .await?;
    info!(habit_id = %habit.id, "habit created");
    Ok(habit.id)
}

pub async fn list_habits(store: &dyn Store, user_id: Uuid) -> Result<Vec<Habit>, AppError> {
    Ok(store.list_habits(user_id).await?)
}

async fn find_owned(store: &dyn Store, habit_id: Uuid, user_id: Uuid) -> Result<Habit, AppError> {
    store
        .find_habit(habit_id, user_id)
        .await?
        .ok_or(AppError::NotFound("Habit"))
}

/// Marks the habit done for the current UTC day and returns the new streak.
pub async fn mark_done(store: &dyn Store, habit_id: Uuid, user_id: Uuid) -> Result<i32, AppError> {
    let today = OffsetDateTime::now_utc().date();
    mark_done_on(store, habit_id, user_id, today).await
}

#[instrument(skip(store))]
pub async fn mark_done_on(
    store: &dyn Store,
    habit_id: Uuid,
    user_id: Uuid,
    today: Date,
) -> Result<i32, AppError> {
    let habit = find_owned(store, habit_id, user_id).await?;

    let streak = match next_streak(habit.last_completion(), habit.streak, today) {
        Ok(s) => s,
        Err(StreakError::AlreadyCompleted(_)) => return Err(AppError::AlreadyCompleted),
        Err(e @ StreakError::FutureCompletion { .. }) => {
            return Err(AppError::Internal(anyhow::Error::new(e).context(format!(
                "habit {habit_id} has out-of-order completion history"
            ))))
        }
    };

    let modified = store
        .record_completion(Completion {
            habit_id,
            user_id,
            seen_completions: habit.completion_dates.len() as i32,
            day: today,
            streak,
        })
        .await?;
    if modified == 0 {
        return Err(AppError::PersistenceConflict);
    }

    info!(%habit_id, streak, "habit marked done");
    Ok(streak)
}

#[instrument(skip(store, patch))]
pub async fn rename_habit(
    store: &dyn Store,
    habit_id: Uuid,
    user_id: Uuid,
    patch: HabitPatch,
) -> Result<(), AppError> {
    find_owned(store, habit_id, user_id).await?;

    if patch.is_empty() {
        debug!(%habit_id, "empty patch");
        return Ok(());
    }
    let name = patch.name.unwrap_or_default();
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Habit name is required".into()));
    }

    if store.rename_habit(habit_id, user_id, name).await? == 0 {
        return Err(AppError::PersistenceConflict);
    }
    Ok(())
}

#[instrument(skip(store))]
pub async fn delete_habit(store: &dyn Store, habit_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    if store.delete_habit(habit_id, user_id).await? == 0 {
        return Err(AppError::NotFound("Habit"));
    }
    info!(%habit_id, "habit deleted");
    Ok(())
}
