use crate::domain::{models::lead::{Lead, LeadFilter}, ports::LeadRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Postgres, PgPool};

pub struct PostgresLeadRepo {
    pool: PgPool,
}

impl PostgresLeadRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, broker_id: &'a str, filter: &'a LeadFilter) {
    qb.push(" WHERE broker_id = ").push_bind(broker_id);
    if let Some(status) = &filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(source) = &filter.source {
        qb.push(" AND source = ").push_bind(source);
    }
    if let Some(property_id) = &filter.property_id {
        qb.push(" AND property_id = ").push_bind(property_id);
    }
}

#[async_trait]
impl LeadRepository for PostgresLeadRepo {
    async fn create(&self, lead: &Lead) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(
            "INSERT INTO leads (id, broker_id, property_id, realtor_id, name, email, phone, message, source, status,
                deal_value, commission_value, deal_closed_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING *"
        )
            .bind(&lead.id).bind(&lead.broker_id).bind(&lead.property_id).bind(&lead.realtor_id)
            .bind(&lead.name).bind(&lead.email).bind(&lead.phone).bind(&lead.message).bind(&lead.source)
            .bind(&lead.status).bind(lead.deal_value).bind(lead.commission_value).bind(lead.deal_closed_at)
            .bind(lead.created_at).bind(lead.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, broker_id: &str, id: &str) -> Result<Option<Lead>, AppError> {
        sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE broker_id = $1 AND id = $2")
            .bind(broker_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, broker_id: &str, filter: &LeadFilter, page: i64, limit: i64) -> Result<(Vec<Lead>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
        push_filters(&mut count_qb, broker_id, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await.map_err(AppError::Database)?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM leads");
        push_filters(&mut qb, broker_id, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind((page - 1).max(0) * limit);

        let rows = qb.build_query_as::<Lead>().fetch_all(&self.pool).await.map_err(AppError::Database)?;
        Ok((rows, total))
    }

    async fn list_all(&self, broker_id: &str) -> Result<Vec<Lead>, AppError> {
        sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE broker_id = $1 ORDER BY created_at DESC")
            .bind(broker_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, lead: &Lead) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(
            "UPDATE leads SET realtor_id=$1, status=$2, deal_value=$3, commission_value=$4, deal_closed_at=$5, updated_at=$6
             WHERE id=$7 AND broker_id=$8
             RETURNING *"
        )
            .bind(&lead.realtor_id).bind(&lead.status).bind(lead.deal_value).bind(lead.commission_value)
            .bind(lead.deal_closed_at).bind(lead.updated_at)
            .bind(&lead.id).bind(&lead.broker_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, broker_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1 AND broker_id = $2")
            .bind(id).bind(broker_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Lead not found".into())); }
        Ok(())
    }

    async fn find_recent_by_email(&self, broker_id: &str, email: &str, since: DateTime<Utc>) -> Result<Option<Lead>, AppError> {
        sqlx::query_as::<_, Lead>(
            "SELECT * FROM leads WHERE broker_id = $1 AND email = $2 AND created_at >= $3 ORDER BY created_at DESC LIMIT 1"
        )
            .bind(broker_id).bind(email).bind(since)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
