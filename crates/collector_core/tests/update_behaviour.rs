use std::sync::Once;

use collector_core::{
    update, AppState, CollectParams, CollectionPhase, Effect, Msg, TargetId,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(collector_logging::initialize_for_tests);
}

fn start_collection(state: AppState, target: TargetId) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::CollectRequested {
            target,
            params: CollectParams::default(),
        },
    )
}

#[test]
fn collect_claims_idle_and_starts_run() {
    init_logging();
    let state = AppState::new();
    let target = TargetId(7);

    let (next, effects) = start_collection(state, target);

    assert_eq!(next.phase(), CollectionPhase::Collecting { target });
    assert_eq!(next.phase().collecting_target(), Some(target));
    assert_eq!(
        effects,
        vec![
            Effect::PersistCollection {
                phase: CollectionPhase::Collecting { target },
                addresses: Vec::new(),
            },
            Effect::StartScrollRun {
                target,
                params: CollectParams::default(),
            },
        ]
    );
}

#[test]
fn second_collect_rejected_while_first_holds_claim() {
    init_logging();
    let first = TargetId(1);
    let second = TargetId(2);

    let (state, _effects) = start_collection(AppState::new(), first);
    let (next, effects) = start_collection(state, second);

    // The earlier claim wins; the second request changes nothing.
    assert_eq!(next.phase(), CollectionPhase::Collecting { target: first });
    assert!(effects.is_empty());
    assert_eq!(next.status(), "A collection is already running.");
}

#[test]
fn extraction_with_addresses_completes_and_records_history() {
    init_logging();
    let target = TargetId(3);
    let (state, _effects) = start_collection(AppState::new(), target);

    let addresses = vec!["a@example.com".to_string(), "b@example.com".to_string()];
    let (next, effects) = update(
        state,
        Msg::ExtractionFinished {
            target,
            addresses: addresses.clone(),
        },
    );

    assert_eq!(next.phase(), CollectionPhase::Completed { target });
    assert_eq!(next.phase().collecting_target(), None);
    assert_eq!(next.collected(), addresses.as_slice());
    assert_eq!(next.status(), "Collected 2 addresses.");
    assert_eq!(
        effects,
        vec![
            Effect::PersistCollection {
                phase: CollectionPhase::Completed { target },
                addresses: addresses.clone(),
            },
            Effect::AppendHistory {
                query_label: String::new(),
                addresses,
            },
        ]
    );
}

#[test]
fn extraction_with_no_addresses_returns_to_idle() {
    init_logging();
    let target = TargetId(4);
    let (state, _effects) = start_collection(AppState::new(), target);

    let (next, effects) = update(
        state,
        Msg::ExtractionFinished {
            target,
            addresses: Vec::new(),
        },
    );

    assert_eq!(next.phase(), CollectionPhase::Idle);
    assert_eq!(next.status(), "No addresses found on this page.");
    assert_eq!(
        effects,
        vec![Effect::PersistCollection {
            phase: CollectionPhase::Idle,
            addresses: Vec::new(),
        }]
    );
}

#[test]
fn late_extraction_from_non_owner_is_discarded() {
    init_logging();
    let owner = TargetId(5);
    let stale = TargetId(6);
    let (state, _effects) = start_collection(AppState::new(), owner);

    let (next, effects) = update(
        state,
        Msg::ExtractionFinished {
            target: stale,
            addresses: vec!["late@example.com".to_string()],
        },
    );

    assert_eq!(next.phase(), CollectionPhase::Collecting { target: owner });
    assert!(next.collected().is_empty());
    assert!(effects.is_empty());
}

#[test]
fn new_collection_allowed_after_completion() {
    init_logging();
    let first = TargetId(8);
    let second = TargetId(9);

    let (state, _effects) = start_collection(AppState::new(), first);
    let (state, _effects) = update(
        state,
        Msg::ExtractionFinished {
            target: first,
            addresses: vec!["done@example.com".to_string()],
        },
    );

    let (next, effects) = start_collection(state, second);

    assert_eq!(next.phase(), CollectionPhase::Collecting { target: second });
    assert!(next.collected().is_empty());
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::StartScrollRun { target, .. } if *target == second)));
}

#[test]
fn open_target_requested_while_idle_emits_open_effect() {
    init_logging();
    let (next, effects) = update(
        AppState::new(),
        Msg::OpenTargetRequested {
            url: "https://example.com/search?keywords=x".to_string(),
        },
    );

    assert_eq!(next.phase(), CollectionPhase::Idle);
    assert_eq!(
        effects,
        vec![Effect::OpenTarget {
            url: "https://example.com/search?keywords=x".to_string(),
        }]
    );
}

#[test]
fn open_target_requested_while_collecting_is_rejected() {
    init_logging();
    let target = TargetId(10);
    let (state, _effects) = start_collection(AppState::new(), target);

    let (next, effects) = update(
        state,
        Msg::OpenTargetRequested {
            url: "https://example.com".to_string(),
        },
    );

    assert_eq!(next.phase(), CollectionPhase::Collecting { target });
    assert!(effects.is_empty());
}
