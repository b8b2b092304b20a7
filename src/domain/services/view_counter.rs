use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info_span, warn, Instrument};

use crate::domain::ports::ListingSource;

pub struct ViewCounter {
    source: Arc<dyn ListingSource>,
}

impl ViewCounter {
    pub fn new(source: Arc<dyn ListingSource>) -> Self {
        Self { source }
    }

    /// Returns the incremented count at once and persists it in the background.
    /// A failed write is logged and dropped.
    pub fn record(&self, property_id: &str, current: i64) -> (i64, JoinHandle<()>) {
        let next = current.saturating_add(1);
        let source = self.source.clone();
        let id = property_id.to_string();
        let span = info_span!("view_counter", property_id = %id, views = next);

        let handle = tokio::spawn(
            async move {
                match source.update_views_count(&id, next).await {
                    Ok(()) => debug!("View count stored"),
                    Err(e) => warn!("Failed to store view count: {}", e),
                }
            }
            .instrument(span),
        );

        (next, handle)
    }
}
