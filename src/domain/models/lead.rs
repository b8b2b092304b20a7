use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Lead {
    pub id: String,
    pub broker_id: String,
    pub property_id: Option<String>,
    pub realtor_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: String,
    pub status: String,
    pub deal_value: Option<f64>,
    pub commission_value: Option<f64>,
    pub deal_closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewLeadParams {
    pub broker_id: String,
    pub property_id: Option<String>,
    pub realtor_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: Option<String>,
}

impl Lead {
    pub fn new(params: NewLeadParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            broker_id: params.broker_id,
            property_id: params.property_id,
            realtor_id: params.realtor_id,
            name: params.name,
            email: params.email.trim().to_lowercase(),
            phone: params.phone,
            message: params.message,
            source: params.source.unwrap_or_else(|| "website".to_string()),
            status: LeadStatus::New.to_string(),
            deal_value: None,
            commission_value: None,
            deal_closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> Option<LeadStatus> {
        self.status.parse().ok()
    }
}

/// Pipeline: new -> contacted -> qualified -> converted | lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Converted,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Converted | LeadStatus::Lost)
    }

    /// Forward one step, or drop out as lost from any open stage.
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        use LeadStatus::*;
        matches!(
            (self, next),
            (New, Contacted) | (Contacted, Qualified) | (Qualified, Converted)
                | (New, Lost) | (Contacted, Lost) | (Qualified, Lost)
        )
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "qualified" => Ok(LeadStatus::Qualified),
            "converted" => Ok(LeadStatus::Converted),
            "lost" => Ok(LeadStatus::Lost),
            other => Err(format!("Unknown lead status: {}", other)),
        }
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub source: Option<String>,
    pub property_id: Option<String>,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct LeadSummary {
    pub total: i64,
    pub by_status: Vec<(String, i64)>,
    pub total_deal_value: f64,
    pub total_commission: f64,
}

impl LeadSummary {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let by_status = LeadStatus::ALL
            .iter()
            .map(|s| (s.to_string(), leads.iter().filter(|l| l.status == s.as_str()).count() as i64))
            .collect();

        Self {
            total: leads.len() as i64,
            by_status,
            total_deal_value: leads.iter().filter_map(|l| l.deal_value).sum(),
            total_commission: leads.iter().filter_map(|l| l.commission_value).sum(),
        }
    }
}
