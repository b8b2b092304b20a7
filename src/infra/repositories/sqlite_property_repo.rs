use crate::domain::{
    models::property::{Property, PropertyDetail, PropertyFilter},
    ports::PropertyRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub struct SqlitePropertyRepo {
    pool: SqlitePool,
}

impl SqlitePropertyRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, broker_id: &'a str, filter: &'a PropertyFilter) {
    qb.push(" WHERE broker_id = ").push_bind(broker_id);
    if filter.active_only {
        qb.push(" AND is_active = 1");
    }
    if let Some(status) = &filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(t) = &filter.property_type {
        qb.push(" AND property_type = ").push_bind(t);
    }
    if let Some(t) = &filter.transaction_type {
        qb.push(" AND transaction_type = ").push_bind(t);
    }
    if let Some(city) = &filter.city {
        qb.push(" AND LOWER(city) = LOWER(").push_bind(city).push(")");
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(bedrooms) = filter.bedrooms {
        qb.push(" AND bedrooms >= ").push_bind(bedrooms);
    }
}

#[async_trait]
impl PropertyRepository for SqlitePropertyRepo {
    async fn create(&self, p: &Property) -> Result<Property, AppError> {
        sqlx::query_as::<_, Property>(
            "INSERT INTO properties (id, broker_id, realtor_id, title, slug, description, price, property_type, transaction_type, status,
                address, neighborhood, city, uf, bedrooms, bathrooms, parking_spaces, area_m2, hoa_fee, hoa_periodicity, iptu_value,
                iptu_periodicity, property_code, main_image_url, images, features, is_active, is_featured, views_count, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&p.id).bind(&p.broker_id).bind(&p.realtor_id).bind(&p.title).bind(&p.slug).bind(&p.description)
            .bind(p.price).bind(&p.property_type).bind(&p.transaction_type).bind(&p.status)
            .bind(&p.address).bind(&p.neighborhood).bind(&p.city).bind(&p.uf).bind(p.bedrooms).bind(p.bathrooms)
            .bind(p.parking_spaces).bind(p.area_m2).bind(p.hoa_fee).bind(&p.hoa_periodicity).bind(p.iptu_value)
            .bind(&p.iptu_periodicity).bind(&p.property_code).bind(&p.main_image_url).bind(&p.images).bind(&p.features)
            .bind(p.is_active).bind(p.is_featured).bind(p.views_count).bind(p.created_at).bind(p.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, broker_id: &str, id: &str) -> Result<Option<Property>, AppError> {
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE broker_id = ? AND id = ?")
            .bind(broker_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_slug(&self, broker_id: &str, slug: &str) -> Result<Option<Property>, AppError> {
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE broker_id = ? AND slug = ?")
            .bind(broker_id).bind(slug)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, broker_id: &str, filter: &PropertyFilter, page: i64, limit: i64) -> Result<(Vec<Property>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM properties");
        push_filters(&mut count_qb, broker_id, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await.map_err(AppError::Database)?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM properties");
        push_filters(&mut qb, broker_id, filter);
        qb.push(" ORDER BY is_featured DESC, created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind((page - 1).max(0) * limit);

        let rows = qb.build_query_as::<Property>().fetch_all(&self.pool).await.map_err(AppError::Database)?;
        Ok((rows, total))
    }

    async fn update(&self, p: &Property) -> Result<Property, AppError> {
        sqlx::query_as::<_, Property>(
            "UPDATE properties SET realtor_id=?, title=?, slug=?, description=?, price=?, property_type=?, transaction_type=?, status=?,
                address=?, neighborhood=?, city=?, uf=?, bedrooms=?, bathrooms=?, parking_spaces=?, area_m2=?, hoa_fee=?, hoa_periodicity=?,
                iptu_value=?, iptu_periodicity=?, property_code=?, main_image_url=?, images=?, features=?, is_active=?, is_featured=?, updated_at=?
             WHERE id=? AND broker_id=?
             RETURNING *"
        )
            .bind(&p.realtor_id).bind(&p.title).bind(&p.slug).bind(&p.description).bind(p.price)
            .bind(&p.property_type).bind(&p.transaction_type).bind(&p.status)
            .bind(&p.address).bind(&p.neighborhood).bind(&p.city).bind(&p.uf).bind(p.bedrooms).bind(p.bathrooms)
            .bind(p.parking_spaces).bind(p.area_m2).bind(p.hoa_fee).bind(&p.hoa_periodicity).bind(p.iptu_value)
            .bind(&p.iptu_periodicity).bind(&p.property_code).bind(&p.main_image_url).bind(&p.images).bind(&p.features)
            .bind(p.is_active).bind(p.is_featured).bind(p.updated_at)
            .bind(&p.id).bind(&p.broker_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, broker_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = ? AND broker_id = ?")
            .bind(id).bind(broker_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Property not found".into())); }
        Ok(())
    }

    async fn find_similar(&self, broker_id: &str, property_type: &str, transaction_type: &str, exclude_id: &str, limit: i64) -> Result<Vec<Property>, AppError> {
        sqlx::query_as::<_, Property>(
            "SELECT * FROM properties
             WHERE broker_id = ? AND property_type = ? AND transaction_type = ? AND id != ? AND is_active = 1
             ORDER BY created_at DESC LIMIT ?"
        )
            .bind(broker_id).bind(property_type).bind(transaction_type).bind(exclude_id).bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn set_views_count(&self, id: &str, views: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE properties SET views_count = ? WHERE id = ?")
            .bind(views).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn probe(&self) -> Result<(), AppError> {
        sqlx::query("SELECT id FROM properties LIMIT 1")
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_public_detail(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<PropertyDetail>, AppError> {
        sqlx::query_as::<_, PropertyDetail>(
            "SELECT p.*, r.name AS realtor_name, r.avatar_url AS realtor_avatar_url, r.creci AS realtor_creci,
                    r.whatsapp_button_text AS realtor_whatsapp_button_text
             FROM properties p
             JOIN brokers b ON b.id = p.broker_id
             LEFT JOIN realtors r ON r.id = p.realtor_id AND r.is_active = 1
             WHERE b.website_slug = ? AND p.slug = ? AND p.is_active = 1 AND b.is_active = 1
             LIMIT 1"
        )
            .bind(broker_slug).bind(property_slug)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_broker_slug_direct(&self, broker_slug: &str, property_slug: &str) -> Result<Vec<Property>, AppError> {
        sqlx::query_as::<_, Property>(
            "SELECT p.* FROM properties p
             JOIN brokers b ON b.id = p.broker_id
             WHERE p.slug = ? AND b.website_slug = ? AND p.is_active = 1
             LIMIT 1"
        )
            .bind(property_slug).bind(broker_slug)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
