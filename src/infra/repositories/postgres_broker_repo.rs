use crate::domain::{models::broker::Broker, ports::BrokerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresBrokerRepo {
    pool: PgPool,
}

impl PostgresBrokerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BrokerRepository for PostgresBrokerRepo {
    async fn create(&self, broker: &Broker) -> Result<Broker, AppError> {
        sqlx::query_as::<_, Broker>(
            "INSERT INTO brokers (id, business_name, display_name, website_slug, custom_domain, email, contact_email, whatsapp_number, creci,
                primary_color, secondary_color, logo_url, site_title, site_description, property_title_template, property_description_template,
                canonical_prefer_custom_domain, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
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
        sqlx::query_as::<_, Broker>("SELECT * FROM brokers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Broker>, AppError> {
        sqlx::query_as::<_, Broker>("SELECT * FROM brokers WHERE website_slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Broker>, AppError> {
        sqlx::query_as::<_, Broker>("SELECT * FROM brokers WHERE custom_domain = $1")
            .bind(domain)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, broker: &Broker) -> Result<Broker, AppError> {
        sqlx::query_as::<_, Broker>(
            "UPDATE brokers SET business_name=$1, display_name=$2, website_slug=$3, custom_domain=$4, contact_email=$5, whatsapp_number=$6, creci=$7,
                primary_color=$8, secondary_color=$9, logo_url=$10, site_title=$11, site_description=$12, property_title_template=$13,
                property_description_template=$14, canonical_prefer_custom_domain=$15, is_active=$16, updated_at=$17
             WHERE id=$18
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
