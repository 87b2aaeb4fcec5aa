//! Collector core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod query;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use query::{compose_query, query_from_url};
pub use state::{AppState, CollectParams, CollectionPhase, FormValues, TargetId};
pub use update::update;
pub use view_model::{ButtonMode, PanelView};
