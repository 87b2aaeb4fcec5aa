use crate::{CollectParams, FormValues, TargetId};

/// Inputs to the state machine.
///
/// Each variant is an observation reported by one of the three contexts;
/// none of them mutate anything directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The interactive panel came to the foreground.
    ///
    /// `active_target_alive` reports whether the stored collecting target, if
    /// any, still exists; the panel re-validates this on every activation
    /// instead of trusting the stored phase.
    PanelOpened {
        foreground: Option<TargetId>,
        active_target_alive: bool,
    },
    /// User asked for a collection against the foreground target.
    CollectRequested {
        target: TargetId,
        params: CollectParams,
    },
    /// User asked for a collection but no usable target exists yet.
    OpenTargetRequested { url: String },
    /// Attaching the collection script to the target failed.
    InjectionFailed { target: TargetId, reason: String },
    /// Message delivery to the injected script failed.
    MessagingFailed { target: TargetId, reason: String },
    /// The scroll/extract run settled and produced its addresses.
    ExtractionFinished {
        target: TargetId,
        addresses: Vec<String>,
    },
    /// The target was closed.
    TargetClosed { target: TargetId },
    /// The target finished a navigation.
    TargetNavigated { target: TargetId },
    /// User edited the form; remember the values for the next session.
    FormEdited { form: FormValues },
    /// Status line expired or was dismissed.
    StatusCleared,
}
