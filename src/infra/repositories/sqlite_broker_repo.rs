use crate::domain::{models::broker::Broker, ports::BrokerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteBrokerRepo {
    pool: SqlitePool,
}

impl SqliteBrokerRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BrokerRepository for SqliteBrokerRepo {
    async fn create(&self, broker: &Broker) -> Result<Broker, AppError> {
        sqlx::query_as::<_, Broker>(
            "INSERT INTO brokers (id, business_name, display_name, website_slug, custom_domain, email, contact_email, whatsapp_number, creci,
                primary_color, secondary_color, logo_url, site_title, site_description, property_title_template, property_description_template,
                canonical_prefer_custom_domain, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&broker.id).bind(&broker.business_name).bind(&broker.display_name).bind(&broker.website_slug)
            .bind(&broker.custom_domain).bind(&broker.email).bind(&broker.contact_email).bind(&broker.whatsapp_number)
            .bind(&broker.creci).bind(&broker.primary_color).bind(&broker.secondary_color).bind(&broker.logo_url)
            .bind(&broker.site_title).bind(&broker.site_description).bind(&broker.property_title_template)
            .bind(&broker.property_description_template).bind(broker.canonical_prefer_custom_domain).bind(broker.is_active)
            .bind(broker.created_at).bind(broker.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Broker>, AppError> {
        sqlx::query_as::<_, Broker>("SELECT * FROM brokers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Broker>, AppError> {
        sqlx::query_as::<_, Broker>("SELECT * FROM brokers WHERE website_slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Broker>, AppError> {
        sqlx::query_as::<_, Broker>("SELECT * FROM brokers WHERE custom_domain = ?")
            .bind(domain)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, broker: &Broker) -> Result<Broker, AppError> {
        sqlx::query_as::<_, Broker>(
            "UPDATE brokers SET business_name=?, display_name=?, website_slug=?, custom_domain=?, contact_email=?, whatsapp_number=?, creci=?,
                primary_color=?, secondary_color=?, logo_url=?, site_title=?, site_description=?, property_title_template=?,
                property_description_template=?, canonical_prefer_custom_domain=?, is_active=?, updated_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&broker.business_name).bind(&broker.display_name).bind(&broker.website_slug).bind(&broker.custom_domain)
            .bind(&broker.contact_email).bind(&broker.whatsapp_number).bind(&broker.creci).bind(&broker.primary_color)
            .bind(&broker.secondary_color).bind(&broker.logo_url).bind(&broker.site_title).bind(&broker.site_description)
            .bind(&broker.property_title_template).bind(&broker.property_description_template)
            .bind(broker.canonical_prefer_custom_domain).bind(broker.is_active).bind(broker.updated_at)
            .bind(&broker.id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
