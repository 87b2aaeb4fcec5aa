use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use collector_engine::{drive, CollectError, PageDriver, RunParams, SETTLE_DELAY};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct ScriptedDriver {
    scrolls: AtomicUsize,
    sweeps: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
    fail_scrolls: bool,
    fail_snapshot: bool,
}

impl ScriptedDriver {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn scroll_by_page(&self) -> Result<(), CollectError> {
        self.record("scroll");
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        if self.fail_scrolls {
            return Err(CollectError::TargetUnavailable("gone".into()));
        }
        Ok(())
    }

    async fn trigger_expanders(&self) -> Result<usize, CollectError> {
        self.record("sweep");
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    async fn snapshot(&self) -> Result<String, CollectError> {
        self.record("snapshot");
        if self.fail_snapshot {
            return Err(CollectError::TargetUnavailable("gone".into()));
        }
        Ok("<body>settled@example.com</body>".to_string())
    }

    async fn fill_search(&self, _selector: &str, _query: &str) -> Result<bool, CollectError> {
        Ok(true)
    }
}

fn params(scroll_count: u32, interval_ms: u64) -> RunParams {
    RunParams {
        scroll_count,
        scroll_interval: Duration::from_millis(interval_ms),
        exclude_terms: Vec::new(),
        unique_only: false,
    }
}

#[tokio::test(start_paused = true)]
async fn runs_iterations_then_final_sweep_then_settles_and_snapshots() {
    let driver = Arc::new(ScriptedDriver::default());
    let cancel = CancellationToken::new();
    let started = tokio::time::Instant::now();

    let html = drive(driver.clone(), &params(3, 500), &cancel).await;

    assert_eq!(html.as_deref(), Some("<body>settled@example.com</body>"));
    assert_eq!(driver.scrolls.load(Ordering::SeqCst), 3);
    // One sweep per iteration plus the final one.
    assert_eq!(driver.sweeps.load(Ordering::SeqCst), 4);
    assert_eq!(
        driver.calls(),
        vec!["scroll", "sweep", "scroll", "sweep", "scroll", "sweep", "sweep", "snapshot"]
    );
    // Three cadence waits plus the fixed settle delay, nothing else.
    assert_eq!(
        started.elapsed(),
        Duration::from_millis(3 * 500) + SETTLE_DELAY
    );
}

#[tokio::test(start_paused = true)]
async fn zero_iterations_still_sweep_and_settle() {
    let driver = Arc::new(ScriptedDriver::default());
    let cancel = CancellationToken::new();

    let html = drive(driver.clone(), &params(0, 1000), &cancel).await;

    assert!(html.is_some());
    assert_eq!(driver.scrolls.load(Ordering::SeqCst), 0);
    assert_eq!(driver.sweeps.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_run_returns_none_without_snapshot() {
    let driver = Arc::new(ScriptedDriver::default());
    let cancel = CancellationToken::new();

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        stopper.cancel();
    });

    let html = drive(driver.clone(), &params(100, 1000), &cancel).await;

    assert!(html.is_none());
    assert!(driver.scrolls.load(Ordering::SeqCst) < 100);
    assert!(!driver.calls().contains(&"snapshot"));
}

#[tokio::test(start_paused = true)]
async fn driver_failures_do_not_abort_the_run() {
    let driver = Arc::new(ScriptedDriver {
        fail_scrolls: true,
        ..ScriptedDriver::default()
    });
    let cancel = CancellationToken::new();

    let html = drive(driver.clone(), &params(2, 100), &cancel).await;

    // Every step still happened and the settled document still came back.
    assert_eq!(html.as_deref(), Some("<body>settled@example.com</body>"));
    assert_eq!(driver.scrolls.load(Ordering::SeqCst), 2);
    assert_eq!(driver.sweeps.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn snapshot_failure_yields_an_empty_document() {
    let driver = Arc::new(ScriptedDriver {
        fail_snapshot: true,
        ..ScriptedDriver::default()
    });
    let cancel = CancellationToken::new();

    let html = drive(driver.clone(), &params(1, 100), &cancel).await;

    assert_eq!(html.as_deref(), Some(""));
}
