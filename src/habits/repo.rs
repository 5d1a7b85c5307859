use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::habits::repo_types::{Completion, Habit};

impl Habit {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        name: &str,
        last_updated: OffsetDateTime,
    ) -> anyhow::Result<Habit> {
        let habit = sqlx::query_as::<_, Habit>(
            r#"
            INSERT INTO habits (user_id, name, streak, last_updated, completion_dates)
            VALUES ($1, $2, 0, $3, '{}')
            RETURNING id, user_id, name, streak, last_updated, completion_dates, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(last_updated)
        .fetch_one(db)
        .await
        .context("insert habit")?;
        Ok(habit)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Habit>> {
        let rows = sqlx::query_as::<_, Habit>(
            r#"
            SELECT id, user_id, name, streak, last_updated, completion_dates, created_at
            FROM habits
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list habits by user")?;
        Ok(rows)
    }

    /// Owner-scoped lookup; a foreign habit is indistinguishable from a missing one.
    pub async fn find_owned(
        db: &PgPool,
        habit_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Habit>> {
        let habit = sqlx::query_as::<_, Habit>(
            r#"
            SELECT id, user_id, name, streak, last_updated, completion_dates, created_at
            FROM habits
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(habit_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("find habit")?;
        Ok(habit)
    }

    pub async fn record_completion(db: &PgPool, c: Completion) -> anyhow::Result<u64> {
        let last_updated = c.day.midnight().assume_utc();
        let res = sqlx::query(
            r#"
            UPDATE habits
               SET completion_dates = array_append(completion_dates, $3),
                   last_updated = $4,
                   streak = $5
             WHERE id = $1
               AND user_id = $2
               AND cardinality(completion_dates) = $6
            "#,
        )
        .bind(c.habit_id)
        .bind(c.user_id)
        .bind(c.day)
        .bind(last_updated)
        .bind(c.streak)
        .bind(c.seen_completions)
        .execute(db)
        .await
        .context("record completion")?;
        Ok(res.rows_affected())
    }

    pub async fn rename(
        db: &PgPool,
        habit_id: Uuid,
        user_id: Uuid,
        name: &str,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(r#"UPDATE habits SET name = $3 WHERE id = $1 AND user_id = $2"#)
            .bind(habit_id)
            .bind(user_id)
            .bind(name)
            .execute(db)
            .await
            .context("rename habit")?;
        Ok(res.rows_affected())
    }

    pub async fn delete_owned(db: &PgPool, habit_id: Uuid, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query(r#"DELETE FROM habits WHERE id = $1 AND user_id = $2"#)
            .bind(habit_id)
            .bind(user_id)
            .execute(db)
            .await
            .context("delete habit")?;
        Ok(res.rows_affected())
    }
}
