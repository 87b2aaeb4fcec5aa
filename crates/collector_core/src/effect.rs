use crate::{CollectParams, CollectionPhase, FormValues, TargetId};

/// Side effects requested by the update function.
///
/// The pure core never performs IO; the owning context executes these in
/// order after applying the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Launch the scroll-drive run against the claimed target.
    StartScrollRun {
        target: TargetId,
        params: CollectParams,
    },
    /// Tear down the in-flight run for this target, if one is still owned.
    AbortScrollRun { target: TargetId },
    /// Write the phase pair and collected addresses to the shared store.
    PersistCollection {
        phase: CollectionPhase,
        addresses: Vec<String>,
    },
    /// Append a history entry for a successful collection.
    AppendHistory {
        query_label: String,
        addresses: Vec<String>,
    },
    /// Create a new target at `url` and schedule the panel resume for it.
    OpenTarget { url: String },
    /// Persist the last-used form values.
    PersistForm { form: FormValues },
}
