use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Too many requests: {0}")]
    TooManyRequests(String),
    #[error("{0}")]
    Connectivity(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// True when the backend could not be reached at all.
    pub fn is_network(&self) -> bool {
        match self {
            AppError::Connectivity(_) => true,
            AppError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed
            ),
            other => is_network_message(&other.to_string()),
        }
    }
}

pub fn is_network_message(message: &str) -> bool {
    message.contains("Failed to fetch")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::Connectivity(msg) => {
                warn!("Listing backend unreachable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            AppError::Upstream(msg) => {
                error!("Listing backend error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Outcome of a failed public page load.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Unable to reach the listing service: {0}")]
    Connectivity(String),
    #[error("Missing broker or property parameters")]
    MissingParameters,
    #[error("Broker not found")]
    TenantNotFound,
    #[error("Property not found")]
    NotFound,
    #[error("Failed to load property: {0}")]
    ListingLoad(String),
    #[error("Failed to load broker: {0}")]
    BrokerLoad(String),
    #[error("{0}")]
    Other(String),
    #[error("Request cancelled")]
    Cancelled,
}

impl LoadError {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Connectivity(_) => "connectivity",
            LoadError::MissingParameters => "missing_parameters",
            LoadError::TenantNotFound => "tenant_not_found",
            LoadError::NotFound => "not_found",
            LoadError::ListingLoad(_) => "listing_load",
            LoadError::BrokerLoad(_) => "broker_load",
            LoadError::Other(_) => "other",
            LoadError::Cancelled => "cancelled",
        }
    }

    /// Network-class failures are the only ones worth an automatic retry.
    pub fn is_network(&self) -> bool {
        match self {
            LoadError::Connectivity(_) => true,
            LoadError::ListingLoad(m) | LoadError::BrokerLoad(m) | LoadError::Other(m) => is_network_message(m),
            _ => false,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            LoadError::Connectivity(_) | LoadError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            LoadError::MissingParameters => StatusCode::BAD_REQUEST,
            LoadError::TenantNotFound | LoadError::NotFound => StatusCode::NOT_FOUND,
            LoadError::BrokerLoad(_) => StatusCode::BAD_GATEWAY,
            LoadError::ListingLoad(_) | LoadError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for LoadError {
    fn from(e: AppError) -> Self {
        if e.is_network() {
            LoadError::Connectivity(e.to_string())
        } else {
            LoadError::Other(e.to_string())
        }
    }
}

impl From<LoadError> for AppError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::Connectivity(msg) => AppError::Connectivity(msg),
            LoadError::MissingParameters => AppError::Validation(e.to_string()),
            LoadError::TenantNotFound | LoadError::NotFound => AppError::NotFound(e.to_string()),
            LoadError::Cancelled => AppError::Connectivity(e.to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for LoadError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(kind = self.kind(), "Page load failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "retryable": self.is_network(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classification() {
        assert!(LoadError::Connectivity("down".into()).is_network());
        assert!(LoadError::ListingLoad("TypeError: Failed to fetch".into()).is_network());
        assert!(!LoadError::ListingLoad("permission denied".into()).is_network());
        assert!(!LoadError::NotFound.is_network());
        assert!(!LoadError::TenantNotFound.is_network());

        assert!(AppError::Connectivity("Failed to fetch: refused".into()).is_network());
        assert!(!AppError::Upstream("500 boom".into()).is_network());
        assert!(AppError::Database(sqlx::Error::PoolTimedOut).is_network());
    }

    #[test]
    fn test_app_error_converts_by_class() {
        let e: LoadError = AppError::Connectivity("Failed to fetch: x".into()).into();
        assert!(matches!(e, LoadError::Connectivity(_)));
        let e: LoadError = AppError::Upstream("bad".into()).into();
        assert!(matches!(e, LoadError::Other(_)));

        let e: AppError = LoadError::TenantNotFound.into();
        assert!(matches!(e, AppError::NotFound(_)));
        let e: AppError = LoadError::MissingParameters.into();
        assert!(matches!(e, AppError::Validation(_)));
    }

    #[test]
    fn test_load_error_status_codes() {
        assert_eq!(LoadError::MissingParameters.status(), StatusCode::BAD_REQUEST);
        assert_eq!(LoadError::TenantNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(LoadError::Connectivity("x".into()).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(LoadError::BrokerLoad("x".into()).status(), StatusCode::BAD_GATEWAY);
    }
}
