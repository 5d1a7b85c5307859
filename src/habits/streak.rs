//! Streak transition applied when a habit is marked done.
//!
//! State is `(last completion date, streak)`. Starting from `(None, 0)`, marking
//! done on `today` moves to `(Some(today), next)` where `next` is:
//!
//! * `1` for an empty history,
//! * `streak + 1` when the last completion was yesterday,
//! * `1` when there is a gap of two or more days.
//!
//! Only the last completion is inspected; the history must be strictly
//! increasing for that to be sound, so a last completion after `today` is
//! rejected instead of appended.

use thiserror::Error;
use time::{Date, Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreakError {
    #[error("already completed on {0}")]
    AlreadyCompleted(Date),
    #[error("last completion {last} is after {today}")]
    FutureCompletion { last: Date, today: Date },
}

pub fn next_streak(last: Option<Date>, streak: i32, today: Date) -> Result<i32, StreakError> {
    let Some(last) = last else {
        return Ok(1);
    };

    if last == today {
        return Err(StreakError::AlreadyCompleted(today));
    }
    if last > today {
        return Err(StreakError::FutureCompletion { last, today });
    }

    if last == today - Duration::days(1) {
        Ok(streak + 1)
    } else {
        Ok(1)
    }
}
