use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::models::{broker::BrokerBranding, property::PropertyDetail};

#[derive(Debug, Clone, PartialEq)]
pub struct PrefetchedDetail {
    pub property: PropertyDetail,
    pub broker: BrokerBranding,
}

struct Entry {
    value: PrefetchedDetail,
    inserted_at: Instant,
    last_used: Instant,
}

type Key = (String, String);

/// Short-lived `{property, broker}` pairs keyed by `(broker_slug, property_slug)`.
pub struct PrefetchCache {
    entries: Mutex<HashMap<Key, Entry>>,
    ttl: Duration,
    capacity: usize,
}

fn key(broker_slug: &str, property_slug: &str) -> Key {
    (broker_slug.to_lowercase(), property_slug.to_lowercase())
}

impl PrefetchCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, broker_slug: &str, property_slug: &str) -> Option<PrefetchedDetail> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let k = key(broker_slug, property_slug);

        let expired = match entries.get_mut(&k) {
            None => return None,
            Some(entry) if now.duration_since(entry.inserted_at) >= self.ttl => true,
            Some(entry) => {
                entry.last_used = now;
                return Some(entry.value.clone());
            }
        };

        if expired {
            entries.remove(&k);
        }
        None
    }

    pub fn set(&self, broker_slug: &str, property_slug: &str, value: PrefetchedDetail) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let k = key(broker_slug, property_slug);

        if !entries.contains_key(&k) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(k, Entry { value, inserted_at: now, last_used: now });
    }

    pub fn invalidate(&self, broker_slug: &str, property_slug: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(&key(broker_slug, property_slug));
    }

    /// Returns how many entries were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, e| now.duration_since(e.inserted_at) < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
