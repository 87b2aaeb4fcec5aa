use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use collector_logging::{ctx_debug, ctx_trace};
use thiserror::Error;
use tokio::time::Instant;

use crate::types::TargetId;

/// Bounded retry description: at most `max_attempts` tries, each only while
/// the record is younger than `window`, each preceded by `backoff`, with the
/// whole record dropped once `give_up_after` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub window: Duration,
    pub backoff: Duration,
    pub give_up_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::from_millis(15_000),
            backoff: Duration::from_millis(1000),
            give_up_after: Duration::from_millis(10_000),
        }
    }
}

/// How the scheduler brings the interactive panel back to the foreground.
///
/// Surfacing is best-effort; failures stay inside the scheduler and are
/// never shown to the user.
#[async_trait]
pub trait PanelSurface: Send + Sync {
    async fn surface(&self, target: TargetId) -> Result<(), SurfaceError>;
}

#[derive(Debug, Error)]
#[error("panel could not be surfaced: {0}")]
pub struct SurfaceError(pub String);

#[derive(Debug, Clone, Copy)]
struct PendingResume {
    created_at: Instant,
    attempts: u32,
}

/// Tracks targets whose panel should be resurfaced once they finish loading.
///
/// The map is transient by design: a restart of the owning context loses it,
/// and resume attempts are best-effort anyway.
pub struct ResumeScheduler {
    policy: RetryPolicy,
    sweep_every: Duration,
    stale_after: Duration,
    pending: Mutex<HashMap<TargetId, PendingResume>>,
}

impl ResumeScheduler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sweep_every: Duration::from_millis(30_000),
            stale_after: Duration::from_millis(20_000),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Records a pending resume for a freshly created target.
    pub fn schedule(&self, target: TargetId) {
        let mut pending = self.pending.lock().expect("lock pending resumes");
        pending.insert(
            target,
            PendingResume {
                created_at: Instant::now(),
                attempts: 0,
            },
        );
        ctx_trace!("scheduled panel resume for target {}", target);
    }

    pub fn is_scheduled(&self, target: TargetId) -> bool {
        self.pending
            .lock()
            .expect("lock pending resumes")
            .contains_key(&target)
    }

    /// Drives one ready-event for `target` through the retry policy.
    ///
    /// On a failed surfacing the same attempt gets exactly one sub-retry
    /// after another backoff; the attempt counter does not move for it.
    pub async fn on_target_ready(&self, target: TargetId, surface: &dyn PanelSurface) {
        let Some(record) = self.claim_attempt(target) else {
            return;
        };

        tokio::time::sleep(self.policy.backoff).await;
        if let Err(err) = surface.surface(target).await {
            ctx_debug!(
                "resume attempt {} for target {} failed: {}",
                record.attempts,
                target,
                err
            );
            tokio::time::sleep(self.policy.backoff).await;
            if let Err(err) = surface.surface(target).await {
                ctx_debug!("resume sub-retry for target {} failed: {}", target, err);
            }
        }
    }

    /// Takes one attempt from the record, dropping it when the policy says
    /// it is spent. Returns the record state for the attempt to use.
    fn claim_attempt(&self, target: TargetId) -> Option<PendingResume> {
        let mut pending = self.pending.lock().expect("lock pending resumes");
        let record = pending.get_mut(&target)?;
        let age = record.created_at.elapsed();

        if age >= self.policy.window || record.attempts >= self.policy.max_attempts {
            pending.remove(&target);
            return None;
        }

        record.attempts += 1;
        let claimed = *record;

        if record.attempts >= self.policy.max_attempts || age > self.policy.give_up_after {
            pending.remove(&target);
        }
        Some(claimed)
    }

    /// Drops the record for a closed target.
    pub fn cancel(&self, target: TargetId) {
        self.pending
            .lock()
            .expect("lock pending resumes")
            .remove(&target);
    }

    /// Removes records whose ready event never fired.
    pub fn sweep(&self) {
        let mut pending = self.pending.lock().expect("lock pending resumes");
        let before = pending.len();
        let stale_after = self.stale_after;
        pending.retain(|_, record| record.created_at.elapsed() <= stale_after);
        let dropped = before - pending.len();
        if dropped > 0 {
            ctx_debug!("swept {} stale resume records", dropped);
        }
    }

    /// Spawns the periodic safety-net sweep.
    pub fn run_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(scheduler.sweep_every);
            loop {
                tick.tick().await;
                scheduler.sweep();
            }
        })
    }
}
