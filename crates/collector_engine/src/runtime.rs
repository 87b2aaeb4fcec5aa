use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::scroll::PageDriver;
use crate::types::{CollectError, TargetEvent, TargetId};

/// The tab/page layer the orchestrator drives.
///
/// Implementations own target lifetime bookkeeping and emit [`TargetEvent`]s
/// on the broadcast channel; the state machine heals its collection phase
/// from those events rather than trusting stored target ids.
#[async_trait]
pub trait TargetRuntime: Send + Sync {
    /// Opens a new target at `url`, returning its handle once the initial
    /// document finished loading.
    async fn open_target(&self, url: &str) -> Result<TargetId, CollectError>;

    /// Whether the target still exists and answers.
    async fn target_exists(&self, target: TargetId) -> bool;

    /// Last observed location of the target.
    async fn target_url(&self, target: TargetId) -> Option<String>;

    /// The scroll/extract driver for a target, if it is still known.
    fn driver(&self, target: TargetId) -> Option<Arc<dyn PageDriver>>;

    /// Lifecycle event stream.
    fn subscribe(&self) -> broadcast::Receiver<TargetEvent>;
}
