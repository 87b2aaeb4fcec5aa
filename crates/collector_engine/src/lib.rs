//! Collector engine: IO pipeline and effect execution.
mod cdp;
mod engine;
mod extract;
mod persist;
mod protocol;
mod resume;
mod runtime;
mod scroll;
mod store;
mod types;

pub use cdp::{CdpDriver, CdpRuntime};
pub use engine::{ChannelPanelSurface, EngineEvent, EngineHandle};
pub use extract::{AddressScanner, SeenCache};
pub use persist::{PersistError, SnapshotWriter};
pub use protocol::{Request, Response};
pub use resume::{PanelSurface, ResumeScheduler, RetryPolicy, SurfaceError};
pub use runtime::TargetRuntime;
pub use scroll::{drive, PageDriver, SETTLE_DELAY};
pub use store::{CollectionStateTag, HistoryEntry, SharedStore, StoreData};
pub use types::{CollectError, RunParams, TargetEvent, TargetId, HISTORY_CAP};
