use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};
use crate::state::AppState;

/// Drops expired prefetch entries on a fixed cadence until `shutdown` fires.
pub async fn start_background_worker(state: Arc<AppState>, shutdown: CancellationToken) {
    info!("Starting prefetch cache sweeper...");

    let interval = Duration::from_secs(state.config.prefetch_ttl_secs.max(1));

    loop {
        let span = info_span!("cache_sweep", entries = state.loader.cache().len());
        async {
            let dropped = state.loader.cache().purge_expired();
            if dropped > 0 {
                info!(dropped, "Purged expired prefetch entries");
            } else {
                debug!("Nothing to purge");
            }
        }
        .instrument(span)
        .await;

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Prefetch cache sweeper stopped");
                return;
            }
            _ = sleep(interval) => {}
        }
    }
}
