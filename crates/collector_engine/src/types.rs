use std::time::Duration;

use thiserror::Error;

/// Opaque handle for a page/tab, stable for the target's lifetime.
pub type TargetId = u64;

/// Most recent collections kept in history; the oldest entry is evicted when
/// a new one would exceed this.
pub const HISTORY_CAP: usize = 50;

/// Lifecycle events emitted by the target runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetEvent {
    /// The target finished loading a document.
    Ready { target: TargetId, url: String },
    /// The target was closed.
    Removed { target: TargetId },
}

/// Parameters of one scroll/extract run. Cadence and count come from the
/// caller; everything else about the run is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub scroll_count: u32,
    pub scroll_interval: Duration,
    pub exclude_terms: Vec<String>,
    pub unique_only: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            scroll_count: 20,
            scroll_interval: Duration::from_millis(2000),
            exclude_terms: Vec::new(),
            unique_only: false,
        }
    }
}

/// Failure taxonomy of the collection pipeline.
///
/// Every variant is recoverable: the state machine translates each into a
/// transition back to idle plus a status line, never into a crash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    #[error("target unavailable: {0}")]
    TargetUnavailable(String),
    #[error("communication failed: {0}")]
    Communication(String),
    #[error("injection failed: {0}")]
    Injection(String),
    #[error("storage failed: {0}")]
    Storage(String),
}

impl From<crate::persist::PersistError> for CollectError {
    fn from(err: crate::persist::PersistError) -> Self {
        CollectError::Storage(err.to_string())
    }
}
