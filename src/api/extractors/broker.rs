use axum::{
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
};
use std::collections::HashMap;
use crate::api::extractors::auth::AuthUser;
use crate::state::AppState;
use std::sync::Arc;

/// `{broker_id}` path segment, checked against the caller's token.
pub struct BrokerScope {
    pub broker_id: String,
    pub user: AuthUser,
}

impl FromRequestParts<Arc<AppState>> for BrokerScope {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let params: Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        let broker_id = params.get("broker_id").ok_or(StatusCode::BAD_REQUEST)?;
        if broker_id != &user.broker_id {
            return Err(StatusCode::FORBIDDEN);
        }

        match state.broker_repo.find_by_id(broker_id).await {
            Ok(Some(_)) => Ok(BrokerScope { broker_id: broker_id.clone(), user }),
            Ok(None) => Err(StatusCode::NOT_FOUND),
            Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
