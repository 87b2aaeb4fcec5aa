use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use collector_logging::{ctx_info, ctx_warn, ContextLabel};
use tokio::sync::broadcast;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::extract::AddressScanner;
use crate::resume::{PanelSurface, ResumeScheduler, RetryPolicy, SurfaceError};
use crate::runtime::TargetRuntime;
use crate::scroll;
use crate::store::{CollectionStateTag, SharedStore};
use crate::types::{CollectError, RunParams, TargetEvent, TargetId};

/// While a collection is in flight the background loop logs at this cadence,
/// keeping liveness observable in the logs.
const HEARTBEAT_EVERY: Duration = Duration::from_millis(20_000);

enum EngineCommand {
    StartRun {
        target: TargetId,
        params: RunParams,
    },
    AbortRun {
        target: TargetId,
    },
    OpenTarget {
        url: String,
    },
    FillSearch {
        target: TargetId,
        selector: String,
        query: String,
    },
    ScheduleResume {
        target: TargetId,
    },
    CheckTarget {
        target: TargetId,
        reply: mpsc::Sender<bool>,
    },
}

/// Notifications handed back to whichever context hosts the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    RunFinished {
        target: TargetId,
        addresses: Vec<String>,
    },
    RunFailed {
        target: TargetId,
        error: CollectError,
    },
    TargetOpened {
        target: TargetId,
        url: String,
    },
    OpenFailed {
        error: CollectError,
    },
    SearchFilled {
        target: TargetId,
        success: bool,
    },
    TargetReady {
        target: TargetId,
        url: String,
    },
    TargetRemoved {
        target: TargetId,
    },
    PanelResume {
        target: TargetId,
    },
}

/// Handle to the long-lived background context.
///
/// Commands go in over a channel and are executed on the engine's own
/// runtime thread; events come back over a plain receiver the hosting
/// context drains at its own pace.
pub struct EngineHandle {
    cmd_tx: UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(runtime: Arc<dyn TargetRuntime>, store: SharedStore) -> Self {
        let (cmd_tx, cmd_rx) = unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
            rt.block_on(run_loop(runtime, store, cmd_rx, event_tx));
        });

        Self { cmd_tx, event_rx }
    }

    pub fn start_run(&self, target: TargetId, params: RunParams) {
        let _ = self.cmd_tx.send(EngineCommand::StartRun { target, params });
    }

    pub fn abort_run(&self, target: TargetId) {
        let _ = self.cmd_tx.send(EngineCommand::AbortRun { target });
    }

    pub fn open_target(&self, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::OpenTarget { url: url.into() });
    }

    pub fn fill_search(
        &self,
        target: TargetId,
        selector: impl Into<String>,
        query: impl Into<String>,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::FillSearch {
            target,
            selector: selector.into(),
            query: query.into(),
        });
    }

    pub fn schedule_resume(&self, target: TargetId) {
        let _ = self.cmd_tx.send(EngineCommand::ScheduleResume { target });
    }

    /// Synchronously re-validates that a target still exists.
    ///
    /// An engine that cannot answer within the timeout counts as a missing
    /// target; the caller heals to idle either way.
    pub fn target_exists(&self, target: TargetId) -> bool {
        let (reply, response) = mpsc::channel();
        if self
            .cmd_tx
            .send(EngineCommand::CheckTarget { target, reply })
            .is_err()
        {
            return false;
        }
        response.recv_timeout(Duration::from_secs(5)).unwrap_or(false)
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct RunHandle {
    target: TargetId,
    cancel: CancellationToken,
    #[allow(dead_code)]
    task: tokio::task::JoinHandle<()>,
}

struct Engine {
    runtime: Arc<dyn TargetRuntime>,
    store: SharedStore,
    scanner: Arc<AddressScanner>,
    scheduler: Arc<ResumeScheduler>,
    event_tx: mpsc::Sender<EngineEvent>,
    active: Option<RunHandle>,
}

async fn run_loop(
    runtime: Arc<dyn TargetRuntime>,
    store: SharedStore,
    mut cmd_rx: UnboundedReceiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    collector_logging::set_context(ContextLabel::Background);

    let scheduler = Arc::new(ResumeScheduler::new(RetryPolicy::default()));
    let sweeper = scheduler.run_sweeper();
    let surface = ChannelPanelSurface::new(event_tx.clone());
    let mut target_events = runtime.subscribe();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_EVERY);

    let mut engine = Engine {
        runtime,
        store,
        scanner: Arc::new(AddressScanner::new()),
        scheduler: Arc::clone(&scheduler),
        event_tx: event_tx.clone(),
        active: None,
    };

    loop {
        tokio::select! {
            command = cmd_rx.recv() => {
                let Some(command) = command else { break };
                engine.handle_command(command).await;
            }
            event = target_events.recv() => match event {
                Ok(TargetEvent::Ready { target, url }) => {
                    engine.store.set_current_url(url.clone());
                    let _ = event_tx.send(EngineEvent::TargetReady { target, url });
                    let scheduler = Arc::clone(&scheduler);
                    let surface = surface.clone();
                    tokio::spawn(async move {
                        scheduler.on_target_ready(target, &surface).await;
                    });
                }
                Ok(TargetEvent::Removed { target }) => {
                    scheduler.cancel(target);
                    let _ = event_tx.send(EngineEvent::TargetRemoved { target });
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    ctx_warn!("lagged behind {} target events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = heartbeat.tick() => {
                let (state, target) = engine.store.collection_pair();
                if state == CollectionStateTag::Collecting {
                    ctx_info!("collection in progress on target {:?}", target);
                }
            }
        }
    }

    sweeper.abort();
}

impl Engine {
    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::StartRun { target, params } => self.start_run(target, params).await,
            EngineCommand::AbortRun { target } => self.abort_run(target),
            EngineCommand::OpenTarget { url } => self.open_target(url).await,
            EngineCommand::FillSearch {
                target,
                selector,
                query,
            } => self.fill_search(target, &selector, &query).await,
            EngineCommand::ScheduleResume { target } => self.scheduler.schedule(target),
            EngineCommand::CheckTarget { target, reply } => {
                let _ = reply.send(self.runtime.target_exists(target).await);
            }
        }
    }

    async fn start_run(&mut self, target: TargetId, params: RunParams) {
        if let Some(stale) = self.active.take() {
            // Ownership already moved on; tear the leftover run down.
            ctx_warn!(
                "aborting stale run on target {} before starting target {}",
                stale.target,
                target
            );
            stale.cancel.cancel();
        }

        if !self.runtime.target_exists(target).await {
            let _ = self.event_tx.send(EngineEvent::RunFailed {
                target,
                error: CollectError::TargetUnavailable("target is gone".into()),
            });
            return;
        }
        let Some(driver) = self.runtime.driver(target) else {
            let _ = self.event_tx.send(EngineEvent::RunFailed {
                target,
                error: CollectError::Injection("no driver for target".into()),
            });
            return;
        };

        let cancel = CancellationToken::new();
        let run_cancel = cancel.clone();
        let scanner = Arc::clone(&self.scanner);
        let store = self.store.clone();
        let event_tx = self.event_tx.clone();
        let task = tokio::spawn(async move {
            ctx_info!("scroll run started on target {}", target);
            let Some(html) = scroll::drive(driver, &params, &run_cancel).await else {
                ctx_info!("scroll run on target {} cancelled", target);
                return;
            };
            let mut seen = store.seen();
            let addresses =
                scanner.scan(&html, &params.exclude_terms, params.unique_only, &mut seen);
            if params.unique_only {
                store.replace_seen(seen);
            }
            let _ = event_tx.send(EngineEvent::RunFinished { target, addresses });
        });

        self.active = Some(RunHandle {
            target,
            cancel,
            task,
        });
    }

    fn abort_run(&mut self, target: TargetId) {
        if let Some(run) = self.active.take_if(|run| run.target == target) {
            ctx_info!("tearing down run on target {}", target);
            run.cancel.cancel();
        }
    }

    async fn open_target(&mut self, url: String) {
        match self.runtime.open_target(&url).await {
            Ok(target) => {
                self.scheduler.schedule(target);
                let _ = self
                    .event_tx
                    .send(EngineEvent::TargetOpened { target, url });
            }
            Err(error) => {
                ctx_warn!("opening target failed: {}", error);
                let _ = self.event_tx.send(EngineEvent::OpenFailed { error });
            }
        }
    }

    async fn fill_search(&mut self, target: TargetId, selector: &str, query: &str) {
        let success = match self.runtime.driver(target) {
            Some(driver) => match driver.fill_search(selector, query).await {
                Ok(success) => success,
                Err(err) => {
                    ctx_warn!("search fill on target {} failed: {}", target, err);
                    false
                }
            },
            None => false,
        };
        let _ = self
            .event_tx
            .send(EngineEvent::SearchFilled { target, success });
    }
}

/// Surfaces the panel by handing an event to whichever context hosts it.
#[derive(Clone)]
pub struct ChannelPanelSurface {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelPanelSurface {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl PanelSurface for ChannelPanelSurface {
    async fn surface(&self, target: TargetId) -> Result<(), SurfaceError> {
        self.tx
            .send(EngineEvent::PanelResume { target })
            .map_err(|err| SurfaceError(err.to_string()))
    }
}
