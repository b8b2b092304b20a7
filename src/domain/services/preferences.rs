use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::domain::models::preferences::{FavoriteProperty, VisitorPreferences};
use crate::domain::ports::PreferenceRepository;
use crate::error::AppError;

pub const DARK_MODE_KEY: &str = "property-detail-dark-mode";
pub const FAVORITES_KEY: &str = "property_favorites";
pub const MAX_FAVORITES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteSort {
    #[default]
    Recent,
    PriceAsc,
    PriceDesc,
    Alphabetical,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct FavoriteFilter {
    pub sort: Option<FavoriteSort>,
    pub transaction_type: Option<String>,
    pub property_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
    LimitReached,
}

/// Stored values are JSON; anything unreadable decays to the default.
pub fn decode_dark_mode(raw: Option<&str>) -> bool {
    raw.and_then(|v| serde_json::from_str::<bool>(v).ok()).unwrap_or(false)
}

pub fn decode_favorites(raw: Option<&str>) -> Vec<FavoriteProperty> {
    raw.and_then(|v| serde_json::from_str::<Vec<FavoriteProperty>>(v).ok()).unwrap_or_default()
}

pub fn add_favorite(favorites: &mut Vec<FavoriteProperty>, favorite: FavoriteProperty) -> AddOutcome {
    if favorites.iter().any(|f| f.id == favorite.id) {
        return AddOutcome::AlreadyPresent;
    }
    if favorites.len() >= MAX_FAVORITES {
        return AddOutcome::LimitReached;
    }
    favorites.insert(0, favorite);
    AddOutcome::Added
}

pub fn remove_favorite(favorites: &mut Vec<FavoriteProperty>, property_id: &str) -> bool {
    let before = favorites.len();
    favorites.retain(|f| f.id != property_id);
    favorites.len() != before
}

pub fn apply_filter(mut favorites: Vec<FavoriteProperty>, filter: &FavoriteFilter) -> Vec<FavoriteProperty> {
    if let Some(t) = &filter.transaction_type {
        favorites.retain(|f| &f.transaction_type == t);
    }
    if let Some(t) = &filter.property_type {
        favorites.retain(|f| &f.property_type == t);
    }
    if let Some(min) = filter.min_price {
        favorites.retain(|f| f.price >= min);
    }
    if let Some(max) = filter.max_price {
        favorites.retain(|f| f.price <= max);
    }
    if let Some(q) = filter.q.as_deref().map(str::to_lowercase).filter(|q| !q.is_empty()) {
        favorites.retain(|f| {
            f.title.to_lowercase().contains(&q)
                || f.city.as_deref().unwrap_or_default().to_lowercase().contains(&q)
                || f.neighborhood.as_deref().unwrap_or_default().to_lowercase().contains(&q)
        });
    }

    match filter.sort.unwrap_or_default() {
        FavoriteSort::Recent => favorites.sort_by(|a, b| b.favorited_at.cmp(&a.favorited_at)),
        FavoriteSort::PriceAsc => favorites.sort_by(|a, b| a.price.total_cmp(&b.price)),
        FavoriteSort::PriceDesc => favorites.sort_by(|a, b| b.price.total_cmp(&a.price)),
        FavoriteSort::Alphabetical => favorites.sort_by_key(|f| f.title.to_lowercase()),
    }
    favorites
}

/// Favorites are read, changed and written back as one value, so writes for the same
/// visitor are serialised.
pub struct PreferenceService {
    repo: Arc<dyn PreferenceRepository>,
    visitor_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PreferenceService {
    pub fn new(repo: Arc<dyn PreferenceRepository>) -> Self {
        Self { repo, visitor_locks: Mutex::new(HashMap::new()) }
    }

    async fn lock_visitor(&self, visitor_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.visitor_locks.lock().unwrap_or_else(|e| e.into_inner());
            // Entries only the map still holds are idle.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(visitor_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub async fn load(&self, visitor_id: &str) -> Result<VisitorPreferences, AppError> {
        let dark_mode = self.repo.get(visitor_id, DARK_MODE_KEY).await?;
        let favorites = self.favorites(visitor_id).await?;
        Ok(VisitorPreferences {
            dark_mode: decode_dark_mode(dark_mode.as_deref()),
            favorites,
        })
    }

    pub async fn favorites(&self, visitor_id: &str) -> Result<Vec<FavoriteProperty>, AppError> {
        let raw = self.repo.get(visitor_id, FAVORITES_KEY).await?;
        let favorites = decode_favorites(raw.as_deref());
        if favorites.is_empty() && raw.as_deref().is_some_and(|v| v != "[]") {
            warn!(visitor_id, "Discarding unreadable favorites value");
        }
        Ok(favorites)
    }

    pub async fn set_dark_mode(&self, visitor_id: &str, enabled: bool) -> Result<(), AppError> {
        let value = serde_json::to_string(&enabled).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        self.repo.set(visitor_id, DARK_MODE_KEY, &value).await
    }

    pub async fn add(&self, visitor_id: &str, favorite: FavoriteProperty) -> Result<AddOutcome, AppError> {
        let _guard = self.lock_visitor(visitor_id).await;
        let mut favorites = self.favorites(visitor_id).await?;
        let property_id = favorite.id.clone();
        let outcome = add_favorite(&mut favorites, favorite);
        if outcome == AddOutcome::Added {
            self.save(visitor_id, &favorites).await?;
            info!(visitor_id, property_id = %property_id, "Favorite added");
        }
        Ok(outcome)
    }

    pub async fn remove(&self, visitor_id: &str, property_id: &str) -> Result<bool, AppError> {
        let _guard = self.lock_visitor(visitor_id).await;
        let mut favorites = self.favorites(visitor_id).await?;
        let removed = remove_favorite(&mut favorites, property_id);
        if removed {
            self.save(visitor_id, &favorites).await?;
            info!(visitor_id, property_id, "Favorite removed");
        }
        Ok(removed)
    }

    pub async fn clear(&self, visitor_id: &str) -> Result<(), AppError> {
        let _guard = self.lock_visitor(visitor_id).await;
        self.repo.remove(visitor_id, FAVORITES_KEY).await
    }

    async fn save(&self, visitor_id: &str, favorites: &[FavoriteProperty]) -> Result<(), AppError> {
        let value = serde_json::to_string(favorites).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        self.repo.set(visitor_id, FAVORITES_KEY, &value).await
    }
}
