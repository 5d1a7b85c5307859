use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};
use uuid::Uuid;

use crate::habits::repo_types::Habit;

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedHabitResponse {
    pub id: Uuid,
}

/// Partial update for `PUT /habits/:id`. Unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HabitPatch {
    #[serde(default)]
    pub name: Option<String>,
}

impl HabitPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct HabitResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub streak: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
    pub completion_dates: Vec<String>, // YYYY-MM-DD
}

impl TryFrom<Habit> for HabitResponse {
    type Error = time::error::Format;

    fn try_from(h: Habit) -> Result<Self, Self::Error> {
        let fmt = format_description!("[year]-[month]-[day]");
        let completion_dates = h
            .completion_dates
            .iter()
            .map(|d| d.format(&fmt))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: h.id,
            user_id: h.user_id,
            name: h.name,
            streak: h.streak,
            last_updated: h.last_updated,
            completion_dates,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MarkDoneResponse {
    pub message: &'static str,
    pub streak: i32,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
