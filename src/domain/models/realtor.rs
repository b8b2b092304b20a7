use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const DEFAULT_WHATSAPP_BUTTON_TEXT: &str = "Falar com o corretor";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Realtor {
    pub id: String,
    pub broker_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub creci: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub whatsapp_button_text: String,
    pub commission_percentage: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Realtor {
    pub fn new(broker_id: String, name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            broker_id,
            name,
            email,
            phone: None,
            creci: None,
            avatar_url: None,
            bio: None,
            whatsapp_button_text: DEFAULT_WHATSAPP_BUTTON_TEXT.to_string(),
            commission_percentage: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
