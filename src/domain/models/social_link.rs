use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct SocialLink {
    pub id: String,
    pub broker_id: String,
    pub platform: String,
    pub url: String,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl SocialLink {
    pub fn new(broker_id: String, platform: String, url: String, display_order: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            broker_id,
            platform,
            url,
            display_order,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
