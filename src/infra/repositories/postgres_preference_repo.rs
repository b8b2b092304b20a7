use crate::domain::ports::PreferenceRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

pub struct PostgresPreferenceRepo {
    pool: PgPool,
}

impl PostgresPreferenceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceRepository for PostgresPreferenceRepo {
    async fn get(&self, visitor_id: &str, key: &str) -> Result<Option<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT pref_value FROM visitor_preferences WHERE visitor_id = $1 AND pref_key = $2"
        )
            .bind(visitor_id).bind(key)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn set(&self, visitor_id: &str, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO visitor_preferences (visitor_id, pref_key, pref_value, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT(visitor_id, pref_key) DO UPDATE SET pref_value = excluded.pref_value, updated_at = excluded.updated_at"
        )
            .bind(visitor_id).bind(key).bind(value).bind(Utc::now())
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn remove(&self, visitor_id: &str, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM visitor_preferences WHERE visitor_id = $1 AND pref_key = $2")
            .bind(visitor_id).bind(key)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
