use std::time::{Duration, Instant};

use collector_core::{
    update, AppState, CollectParams, CollectionPhase, Effect, FormValues, Msg, PanelView,
    TargetId,
};
use collector_engine::{
    CollectError, CollectionStateTag, EngineEvent, EngineHandle, HistoryEntry, Request, Response,
    RunParams, SharedStore,
};
use collector_logging::ctx_warn;

/// Default selector for the page's own search input, used by the
/// search-retype request. Pages with a differently shaped input can override
/// it per orchestrator.
pub const DEFAULT_SEARCH_SELECTOR: &str = r#"input[type="search"]"#;

/// Events the panel cares about directly, as opposed to the ones that only
/// move the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelNotice {
    TargetOpened(TargetId),
    OpenFailed(String),
    SearchFilled(TargetId, bool),
    Resume(TargetId),
}

/// The long-lived context: owns the state machine, executes its effects
/// against the engine, and heals the phase from target lifecycle events.
pub struct Orchestrator {
    state: AppState,
    engine: EngineHandle,
    store: SharedStore,
    search_selector: String,
}

impl Orchestrator {
    pub fn new(engine: EngineHandle, store: SharedStore) -> Self {
        let snapshot = store.snapshot();
        let phase = match (snapshot.collection_state, snapshot.active_collection_tab_id) {
            (CollectionStateTag::Collecting, Some(target)) => CollectionPhase::Collecting {
                target: TargetId(target),
            },
            (CollectionStateTag::Completed, Some(target)) => CollectionPhase::Completed {
                target: TargetId(target),
            },
            _ => CollectionPhase::Idle,
        };
        let form = FormValues {
            keywords: snapshot.keywords,
            scroll_count: snapshot.scroll_count,
            exclude_keywords: snapshot.exclude_keywords,
            include_unique: snapshot.include_unique,
        };
        let state = AppState::restore(phase, snapshot.collected_emails, form);

        Self {
            state,
            engine,
            store,
            search_selector: DEFAULT_SEARCH_SELECTOR.to_string(),
        }
    }

    pub fn with_search_selector(mut self, selector: impl Into<String>) -> Self {
        self.search_selector = selector.into();
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> PanelView {
        self.state.view()
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Applies a message to the state machine and executes its effects.
    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartScrollRun { target, params } => {
                    self.engine.start_run(target.0, map_params(&params));
                }
                Effect::AbortScrollRun { target } => self.engine.abort_run(target.0),
                Effect::PersistCollection { phase, addresses } => {
                    let (tag, owner) = map_phase(phase);
                    self.store.set_collection(tag, owner, addresses);
                }
                Effect::AppendHistory {
                    query_label,
                    addresses,
                } => {
                    self.store
                        .append_history(HistoryEntry::new(query_label, addresses));
                }
                Effect::OpenTarget { url } => self.engine.open_target(url),
                Effect::PersistForm { form } => self.store.set_form(
                    form.keywords,
                    form.scroll_count,
                    form.exclude_keywords,
                    form.include_unique,
                ),
            }
        }
    }

    /// Panel activation: re-validates the stored claim against a live target
    /// before trusting it, then lets the state machine heal or render.
    pub fn open_panel(&mut self, foreground: Option<TargetId>) -> PanelView {
        let (tag, owner) = self.store.collection_pair();
        let active_target_alive = match (tag, owner) {
            (CollectionStateTag::Collecting, Some(target)) => self.engine.target_exists(target),
            (CollectionStateTag::Collecting, None) => false,
            _ => true,
        };
        self.dispatch(Msg::PanelOpened {
            foreground,
            active_target_alive,
        });
        self.view()
    }

    /// Routes one engine event into the state machine; panel-facing events
    /// come back as notices instead.
    pub fn apply_event(&mut self, event: EngineEvent) -> Option<PanelNotice> {
        match event {
            EngineEvent::RunFinished { target, addresses } => {
                self.dispatch(Msg::ExtractionFinished {
                    target: TargetId(target),
                    addresses,
                });
                None
            }
            EngineEvent::RunFailed { target, error } => {
                self.dispatch(failure_msg(TargetId(target), error));
                None
            }
            EngineEvent::TargetReady { target, .. } => {
                self.dispatch(Msg::TargetNavigated {
                    target: TargetId(target),
                });
                None
            }
            EngineEvent::TargetRemoved { target } => {
                self.dispatch(Msg::TargetClosed {
                    target: TargetId(target),
                });
                None
            }
            EngineEvent::TargetOpened { target, .. } => {
                Some(PanelNotice::TargetOpened(TargetId(target)))
            }
            EngineEvent::OpenFailed { error } => Some(PanelNotice::OpenFailed(error.to_string())),
            EngineEvent::SearchFilled { target, success } => {
                Some(PanelNotice::SearchFilled(TargetId(target), success))
            }
            EngineEvent::PanelResume { target } => Some(PanelNotice::Resume(TargetId(target))),
        }
    }

    /// Drains every queued engine event.
    pub fn pump(&mut self) -> Vec<PanelNotice> {
        let mut notices = Vec::new();
        while let Some(event) = self.engine.try_recv() {
            if let Some(notice) = self.apply_event(event) {
                notices.push(notice);
            }
        }
        notices
    }

    /// Pumps events until a notice satisfies `matches`, or until the
    /// deadline passes.
    pub fn pump_until(
        &mut self,
        timeout: Duration,
        matches: impl Fn(&PanelNotice) -> bool,
    ) -> Option<PanelNotice> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let Some(event) = self
                .engine
                .recv_timeout(remaining.min(Duration::from_millis(100)))
            else {
                continue;
            };
            if let Some(notice) = self.apply_event(event) {
                if matches(&notice) {
                    return Some(notice);
                }
            }
        }
    }

    /// Pumps events until the current collection settles one way or the
    /// other, then returns the rendered view.
    pub fn wait_while_collecting(&mut self, timeout: Duration) -> PanelView {
        let deadline = Instant::now() + timeout;
        while self.state.phase().is_collecting() {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                ctx_warn!("collection did not settle within {:?}", timeout);
                break;
            };
            if let Some(event) = self
                .engine
                .recv_timeout(remaining.min(Duration::from_millis(100)))
            {
                self.apply_event(event);
            }
        }
        self.view()
    }

    /// The request/response endpoint external UI collaborators talk to.
    pub fn handle_request(&mut self, request: Request, foreground: Option<TargetId>) -> Response {
        match request {
            Request::CollectEmails {
                scroll_count,
                scroll_speed,
                exclude_keywords,
                include_unique,
            } => {
                let Some(target) = foreground else {
                    return Response::Emails { emails: Vec::new() };
                };
                let params = CollectParams {
                    scroll_count,
                    scroll_interval_ms: scroll_speed,
                    exclude_terms: exclude_keywords,
                    unique_only: include_unique,
                };
                let deadline = run_deadline(&params);
                self.dispatch(Msg::CollectRequested { target, params });
                self.wait_while_collecting(deadline);
                Response::Emails {
                    emails: self.state.collected().to_vec(),
                }
            }
            Request::ClearCache => {
                self.store.clear_seen();
                Response::ok()
            }
            Request::UpdateSearchInput { keywords } => {
                let Some(target) = foreground else {
                    return Response::failed();
                };
                self.engine
                    .fill_search(target.0, self.search_selector.clone(), keywords);
                match self.pump_until(Duration::from_secs(10), |notice| {
                    matches!(notice, PanelNotice::SearchFilled(filled, _) if *filled == target)
                }) {
                    Some(PanelNotice::SearchFilled(_, success)) => Response::Ack { success },
                    _ => Response::failed(),
                }
            }
            Request::OpenPopupOnTabReady { tab_id } => {
                self.engine.schedule_resume(tab_id);
                Response::ok()
            }
            Request::UpdateState { data } => match self.store.merge_value(data) {
                Ok(()) => Response::ok(),
                Err(err) => {
                    ctx_warn!("state proxy write failed: {}", err);
                    Response::failed()
                }
            },
            Request::GetState { keys } => Response::State(self.store.select_value(&keys)),
        }
    }
}

/// Worst-case run length: every cadence wait, the settle delay, plus slack
/// for the driver's own latency.
fn run_deadline(params: &CollectParams) -> Duration {
    Duration::from_millis(u64::from(params.scroll_count) * params.scroll_interval_ms)
        + Duration::from_millis(2000)
        + Duration::from_secs(30)
}

fn map_params(params: &CollectParams) -> RunParams {
    RunParams {
        scroll_count: params.scroll_count,
        scroll_interval: Duration::from_millis(params.scroll_interval_ms),
        exclude_terms: params.exclude_terms.clone(),
        unique_only: params.unique_only,
    }
}

fn map_phase(phase: CollectionPhase) -> (CollectionStateTag, Option<collector_engine::TargetId>) {
    match phase {
        CollectionPhase::Idle => (CollectionStateTag::Idle, None),
        CollectionPhase::Collecting { target } => (CollectionStateTag::Collecting, Some(target.0)),
        CollectionPhase::Completed { target } => (CollectionStateTag::Completed, Some(target.0)),
    }
}

fn failure_msg(target: TargetId, error: CollectError) -> Msg {
    match error {
        CollectError::Injection(reason) => Msg::InjectionFailed { target, reason },
        CollectError::Communication(reason) | CollectError::Storage(reason) => {
            Msg::MessagingFailed { target, reason }
        }
        CollectError::TargetUnavailable(_) => Msg::TargetClosed { target },
    }
}
