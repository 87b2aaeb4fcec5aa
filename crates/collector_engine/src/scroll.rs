use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use collector_logging::{ctx_debug, ctx_warn};
use tokio_util::sync::CancellationToken;

use crate::types::{CollectError, RunParams};

/// Fixed wait after the last expand sweep before the snapshot, absorbing the
/// page's own asynchronous content loading. Trades collection speed for
/// completeness at a flat rate.
pub const SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// One page/tab the scroll-drive controller can act on.
///
/// Implementations must keep `trigger_expanders` idempotent: an expand
/// action already fired once is marked on the page and never fired again,
/// however often the page is re-scanned.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Scrolls the viewport down by one page height.
    async fn scroll_by_page(&self) -> Result<(), CollectError>;

    /// Fires every not-yet-fired "expand content" action; returns how many.
    async fn trigger_expanders(&self) -> Result<usize, CollectError>;

    /// Returns the rendered document.
    async fn snapshot(&self) -> Result<String, CollectError>;

    /// Types a query into the page's search input and submits it. Returns
    /// whether an input was found and filled.
    async fn fill_search(&self, selector: &str, query: &str) -> Result<bool, CollectError>;
}

/// Drives the page through its growth steps, then hands back the settled
/// document.
///
/// Driver failures mid-run do not abort the run; a target that vanished
/// yields an empty document and extraction simply finds nothing. `None` is
/// returned only when the owning state machine cancelled the run.
pub async fn drive(
    driver: Arc<dyn PageDriver>,
    params: &RunParams,
    cancel: &CancellationToken,
) -> Option<String> {
    for step in 0..params.scroll_count {
        if sleep_or_cancelled(params.scroll_interval, cancel).await {
            return None;
        }
        if let Err(err) = driver.scroll_by_page().await {
            ctx_warn!("scroll step {} failed: {}", step, err);
        }
        match driver.trigger_expanders().await {
            Ok(fired) if fired > 0 => ctx_debug!("step {} fired {} expand actions", step, fired),
            Ok(_) => {}
            Err(err) => ctx_warn!("expander sweep at step {} failed: {}", step, err),
        }
    }

    // Final sweep catches actions only revealed by the last scroll.
    if let Err(err) = driver.trigger_expanders().await {
        ctx_warn!("final expander sweep failed: {}", err);
    }

    if sleep_or_cancelled(SETTLE_DELAY, cancel).await {
        return None;
    }

    match driver.snapshot().await {
        Ok(html) => Some(html),
        Err(err) => {
            ctx_warn!("snapshot failed, treating document as empty: {}", err);
            Some(String::new())
        }
    }
}

async fn sleep_or_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}
