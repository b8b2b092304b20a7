use crate::domain::{models::realtor::Realtor, ports::RealtorRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteRealtorRepo {
    pool: SqlitePool,
}

impl SqliteRealtorRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RealtorRepository for SqliteRealtorRepo {
    async fn create(&self, r: &Realtor) -> Result<Realtor, AppError> {
        sqlx::query_as::<_, Realtor>(
            "INSERT INTO realtors (id, broker_id, name, email, phone, creci, avatar_url, bio, whatsapp_button_text,
                commission_percentage, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&r.id).bind(&r.broker_id).bind(&r.name).bind(&r.email).bind(&r.phone).bind(&r.creci)
            .bind(&r.avatar_url).bind(&r.bio).bind(&r.whatsapp_button_text).bind(r.commission_percentage)
            .bind(r.is_active).bind(r.created_at).bind(r.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, broker_id: &str, id: &str) -> Result<Option<Realtor>, AppError> {
        sqlx::query_as::<_, Realtor>("SELECT * FROM realtors WHERE broker_id = ? AND id = ?")
            .bind(broker_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, broker_id: &str) -> Result<Vec<Realtor>, AppError> {
        sqlx::query_as::<_, Realtor>("SELECT * FROM realtors WHERE broker_id = ? ORDER BY name ASC")
            .bind(broker_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, r: &Realtor) -> Result<Realtor, AppError> {
        sqlx::query_as::<_, Realtor>(
            "UPDATE realtors SET name=?, email=?, phone=?, creci=?, avatar_url=?, bio=?, whatsapp_button_text=?,
                commission_percentage=?, is_active=?, updated_at=?
             WHERE id=? AND broker_id=?
             RETURNING *"
        )
            .bind(&r.name).bind(&r.email).bind(&r.phone).bind(&r.creci).bind(&r.avatar_url).bind(&r.bio)
            .bind(&r.whatsapp_button_text).bind(r.commission_percentage).bind(r.is_active).bind(r.updated_at)
            .bind(&r.id).bind(&r.broker_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, broker_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM realtors WHERE id = ? AND broker_id = ?")
            .bind(id).bind(broker_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Realtor not found".into())); }
        Ok(())
    }
}
