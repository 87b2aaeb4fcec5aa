use crate::{AppState, CollectionPhase, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PanelOpened {
            foreground,
            active_target_alive,
        } => {
            state.set_foreground(foreground);
            match state.phase() {
                CollectionPhase::Collecting { .. } if !active_target_alive => {
                    // The stored claim points at a dead target: heal to idle
                    // rather than trusting a value no context can act on.
                    state.set_phase(CollectionPhase::Idle);
                    state.clear_collected();
                    state.set_status("");
                    vec![persist(&state)]
                }
                CollectionPhase::Collecting { target } => {
                    if foreground == Some(target) {
                        state.set_status("Collection in progress...");
                    } else {
                        state.set_status("");
                    }
                    Vec::new()
                }
                CollectionPhase::Completed { .. } | CollectionPhase::Idle => {
                    state.set_status("");
                    Vec::new()
                }
            }
        }
        Msg::CollectRequested { target, params } => match state.phase() {
            CollectionPhase::Collecting { .. } => {
                // At most one collection system-wide; the earlier claim wins.
                state.set_status("A collection is already running.");
                Vec::new()
            }
            CollectionPhase::Idle | CollectionPhase::Completed { .. } => {
                state.set_phase(CollectionPhase::Collecting { target });
                state.clear_collected();
                state.set_status("Starting collection...");
                vec![
                    persist(&state),
                    Effect::StartScrollRun { target, params },
                ]
            }
        },
        Msg::OpenTargetRequested { url } => {
            if state.phase().is_collecting() {
                state.set_status("A collection is already running.");
                Vec::new()
            } else {
                state.set_status("Opening a new target...");
                vec![Effect::OpenTarget { url }]
            }
        }
        Msg::InjectionFailed { target, reason } => {
            abort_if_owner(&mut state, target, &format!("Injection failed: {reason}"), false)
        }
        Msg::MessagingFailed { target, reason } => abort_if_owner(
            &mut state,
            target,
            &format!("Communication failed: {reason}"),
            false,
        ),
        Msg::ExtractionFinished { target, addresses } => match state.phase() {
            CollectionPhase::Collecting { target: owner } if owner == target => {
                if addresses.is_empty() {
                    state.set_phase(CollectionPhase::Idle);
                    state.set_status("No addresses found on this page.");
                    vec![persist(&state)]
                } else {
                    state.set_phase(CollectionPhase::Completed { target });
                    state.set_status(format!("Collected {} addresses.", addresses.len()));
                    state.set_collected(addresses.clone());
                    vec![
                        persist(&state),
                        Effect::AppendHistory {
                            query_label: state.form().keywords.trim().to_string(),
                            addresses,
                        },
                    ]
                }
            }
            // Late result of a run whose ownership is gone: discard.
            _ => Vec::new(),
        },
        Msg::TargetClosed { target } => {
            abort_if_owner(&mut state, target, "Collection target was closed.", true)
        }
        Msg::TargetNavigated { target } => abort_if_owner(
            &mut state,
            target,
            "Collection target navigated away.",
            true,
        ),
        Msg::FormEdited { form } => {
            state.set_form(form.clone());
            vec![Effect::PersistForm { form }]
        }
        Msg::StatusCleared => {
            state.set_status("");
            Vec::new()
        }
    };

    (state, effects)
}

/// `Collecting → Idle` when `target` holds the claim; no-op otherwise.
///
/// `abort_run` additionally tears down the owned scroll-run task, for the
/// paths where the run may still be alive (close/navigate) as opposed to the
/// paths where the run itself already failed.
fn abort_if_owner(
    state: &mut AppState,
    target: crate::TargetId,
    status: &str,
    abort_run: bool,
) -> Vec<Effect> {
    match state.phase() {
        CollectionPhase::Collecting { target: owner } if owner == target => {
            state.set_phase(CollectionPhase::Idle);
            state.clear_collected();
            state.set_status(status);
            let mut effects = Vec::with_capacity(2);
            if abort_run {
                effects.push(Effect::AbortScrollRun { target });
            }
            effects.push(persist(state));
            effects
        }
        _ => Vec::new(),
    }
}

fn persist(state: &AppState) -> Effect {
    Effect::PersistCollection {
        phase: state.phase(),
        addresses: state.collected().to_vec(),
    }
}
