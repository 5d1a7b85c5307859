use axum::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::config::AppConfig;
use crate::habits::repo_types::{Completion, Habit};

/// Persistence used by the auth and habit services.
///
/// Every mutating call is a single statement; counts returned are the rows
/// the statement touched.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// `None` if the email is already registered.
    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>>;

    async fn insert_habit(
        &self,
        user_id: Uuid,
        name: &str,
        last_updated: OffsetDateTime,
    ) -> anyhow::Result<Habit>;
    async fn list_habits(&self, user_id: Uuid) -> anyhow::Result<Vec<Habit>>;
    async fn find_habit(&self, habit_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Habit>>;
    async fn record_completion(&self, completion: Completion) -> anyhow::Result<u64>;
    async fn rename_habit(&self, habit_id: Uuid, user_id: Uuid, name: &str) -> anyhow::Result<u64>;
    async fn delete_habit(&self, habit_id: Uuid, user_id: Uuid) -> anyhow::Result<u64>;

    async fn close(&self);
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;
        info!(max_connections = config.db_max_connections, "database pool ready");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        User::find_by_email(&self.pool, email).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        User::find_by_id(&self.pool, id).await
    }

    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        User::create(&self.pool, username, email, password_hash).await
    }

    async fn insert_habit(
        &self,
        user_id: Uuid,
        name: &str,
        last_updated: OffsetDateTime,
    ) -> anyhow::Result<Habit> {
        Habit::create(&self.pool, user_id, name, last_updated).await
    }

    async fn list_habits(&self, user_id: Uuid) -> anyhow::Result<Vec<Habit>> {
        Habit::list_by_user(&self.pool, user_id).await
    }

    async fn find_habit(&self, habit_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<Habit>> {
        Habit::find_owned(&self.pool, habit_id, user_id).await
    }

    async fn record_completion(&self, completion: Completion) -> anyhow::Result<u64> {
        Habit::record_completion(&self.pool, completion).await
    }

    async fn rename_habit(&self, habit_id: Uuid, user_id: Uuid, name: &str) -> anyhow::Result<u64> {
        Habit::rename(&self.pool, habit_id, user_id, name).await
    }

    async fn delete_habit(&self, habit_id: Uuid, user_id: Uuid) -> anyhow::Result<u64> {
        Habit::delete_owned(&self.pool, habit_id, user_id).await
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}
