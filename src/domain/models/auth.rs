use serde::{Deserialize, Serialize};

pub const AUDIENCE: &str = "listing-panel";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://listings.local/claims/broker_id")]
    pub broker_id: String,

    #[serde(rename = "https://listings.local/claims/role")]
    pub role: String,

    #[serde(rename = "https://listings.local/claims/csrf")]
    pub csrf_token: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub csrf_token: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
pub struct UserProfile {
    pub id: String,
    pub broker_id: String,
    pub email: String,
    pub role: String,
}
