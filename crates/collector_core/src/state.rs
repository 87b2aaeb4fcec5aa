use std::fmt;

/// Opaque, stable handle for the page/tab a collection operates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Caller-supplied knobs for one collection run.
///
/// Everything not listed here (settle delay, resume windows, history cap) is
/// a fixed constant of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectParams {
    pub scroll_count: u32,
    pub scroll_interval_ms: u64,
    pub exclude_terms: Vec<String>,
    pub unique_only: bool,
}

impl Default for CollectParams {
    fn default() -> Self {
        Self {
            scroll_count: 20,
            scroll_interval_ms: 2000,
            exclude_terms: Vec::new(),
            unique_only: false,
        }
    }
}

/// Collection phase together with its owning target.
///
/// Keeping the pair in one variant makes "an owning target is recorded iff a
/// collection is running" impossible to violate from outside [`update`]:
/// there is no second key to fall out of sync with.
///
/// [`update`]: crate::update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionPhase {
    #[default]
    Idle,
    Collecting {
        target: TargetId,
    },
    Completed {
        target: TargetId,
    },
}

impl CollectionPhase {
    /// The target currently driving a collection, if one is running.
    pub fn collecting_target(&self) -> Option<TargetId> {
        match self {
            CollectionPhase::Collecting { target } => Some(*target),
            _ => None,
        }
    }

    /// The target whose results (in-flight or finished) are on display.
    pub fn display_target(&self) -> Option<TargetId> {
        match self {
            CollectionPhase::Collecting { target } | CollectionPhase::Completed { target } => {
                Some(*target)
            }
            CollectionPhase::Idle => None,
        }
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self, CollectionPhase::Collecting { .. })
    }
}

/// Last-used form values, persisted across panel sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
    pub keywords: String,
    pub scroll_count: u32,
    pub exclude_keywords: String,
    pub include_unique: bool,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            scroll_count: 20,
            exclude_keywords: String::new(),
            include_unique: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    phase: CollectionPhase,
    foreground: Option<TargetId>,
    collected: Vec<String>,
    status: String,
    form: FormValues,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds state from a persisted snapshot at context startup.
    ///
    /// The phase is taken as stored; healing against dead targets happens on
    /// the first `PanelOpened` message, not here, because target liveness is
    /// an observation only a running context can make.
    pub fn restore(phase: CollectionPhase, collected: Vec<String>, form: FormValues) -> Self {
        Self {
            phase,
            foreground: None,
            collected,
            status: String::new(),
            form,
        }
    }

    pub fn phase(&self) -> CollectionPhase {
        self.phase
    }

    pub fn foreground(&self) -> Option<TargetId> {
        self.foreground
    }

    pub fn collected(&self) -> &[String] {
        &self.collected
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub(crate) fn set_phase(&mut self, phase: CollectionPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_foreground(&mut self, foreground: Option<TargetId>) {
        self.foreground = foreground;
    }

    pub(crate) fn set_collected(&mut self, collected: Vec<String>) {
        self.collected = collected;
    }

    pub(crate) fn clear_collected(&mut self) {
        self.collected.clear();
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub(crate) fn set_form(&mut self, form: FormValues) {
        self.form = form;
    }
}
