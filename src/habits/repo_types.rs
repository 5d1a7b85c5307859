use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Habit record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub streak: i32,
    pub last_updated: Option<OffsetDateTime>,
    pub completion_dates: Vec<Date>, // strictly increasing
    pub created_at: OffsetDateTime,
}

impl Habit {
    pub fn last_completion(&self) -> Option<Date> {
        self.completion_dates.last().copied()
    }
}

/// One "mark done" write.
///
/// `seen_completions` is the length of `completion_dates` the caller read; the
/// write only applies while the stored history still has that length.
#[derive(Debug, Clone, Copy)]
pub struct Completion {
    pub habit_id: Uuid,
    pub user_id: Uuid,
    pub seen_completions: i32,
    pub day: Date,
    pub streak: i32,
}
