use crate::domain::{models::social_link::SocialLink, ports::SocialLinkRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteSocialLinkRepo {
    pool: SqlitePool,
}

impl SqliteSocialLinkRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SocialLinkRepository for SqliteSocialLinkRepo {
    async fn create(&self, link: &SocialLink) -> Result<SocialLink, AppError> {
        sqlx::query_as::<_, SocialLink>(
            "INSERT INTO social_links (id, broker_id, platform, url, display_order, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&link.id).bind(&link.broker_id).bind(&link.platform).bind(&link.url)
            .bind(link.display_order).bind(link.is_active).bind(link.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, broker_id: &str) -> Result<Vec<SocialLink>, AppError> {
        sqlx::query_as::<_, SocialLink>("SELECT * FROM social_links WHERE broker_id = ? ORDER BY display_order ASC")
            .bind(broker_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active(&self, broker_id: &str) -> Result<Vec<SocialLink>, AppError> {
        sqlx::query_as::<_, SocialLink>(
            "SELECT * FROM social_links WHERE broker_id = ? AND is_active = 1 ORDER BY display_order ASC"
        )
            .bind(broker_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, broker_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM social_links WHERE id = ? AND broker_id = ?")
            .bind(id).bind(broker_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Social link not found".into())); }
        Ok(())
    }
}
