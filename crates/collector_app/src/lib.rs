//! Collector app: wiring of the three execution contexts around the pure
//! state machine — the long-lived background orchestrator, the transient
//! panel session, and persistence/logging setup.
pub mod background;
pub mod logging;
pub mod panel;
pub mod persistence;
