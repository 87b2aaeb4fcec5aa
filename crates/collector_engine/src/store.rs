use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use collector_logging::ctx_warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extract::SeenCache;
use crate::persist::{PersistError, SnapshotWriter};
use crate::types::{TargetId, HISTORY_CAP};

/// The stored collection-phase tag. Read and written only together with
/// `activeCollectionTabId`; the pair is the system-wide mutual-exclusion
/// convention, not a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CollectionStateTag {
    #[default]
    Idle,
    Collecting,
    Completed,
}

/// One past collection, newest first in [`StoreData::history`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Millisecond timestamp doubling as the entry id.
    pub id: i64,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub query_label: String,
    pub addresses: Vec<String>,
    pub count: usize,
}

impl HistoryEntry {
    pub fn new(query_label: String, addresses: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            timestamp: now.to_rfc3339(),
            count: addresses.len(),
            query_label,
            addresses,
        }
    }
}

/// The full logical schema of the shared persistent store.
///
/// Field names are the wire-level key names; external collaborators read the
/// same snapshot, so the serialized shape is a compatibility contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreData {
    pub collection_state: CollectionStateTag,
    pub active_collection_tab_id: Option<TargetId>,
    pub collected_emails: Vec<String>,
    pub cached_emails: SeenCache,
    pub history: Vec<HistoryEntry>,
    pub current_tab_url: String,
    pub keywords: String,
    pub scroll_count: u32,
    pub exclude_keywords: String,
    pub include_unique: bool,
    pub theme: String,
    pub scroll_speed: u64,
    pub auto_navigate: bool,
    pub show_notifications: bool,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            collection_state: CollectionStateTag::Idle,
            active_collection_tab_id: None,
            collected_emails: Vec::new(),
            cached_emails: SeenCache::new(),
            history: Vec::new(),
            current_tab_url: String::new(),
            keywords: String::new(),
            scroll_count: 20,
            exclude_keywords: String::new(),
            include_unique: false,
            theme: "system".to_string(),
            scroll_speed: 2000,
            auto_navigate: true,
            show_notifications: true,
        }
    }
}

/// Narrow typed accessor over the process-wide persistent store.
///
/// The store gives last-writer-wins per snapshot and nothing more; callers
/// re-validate target existence before trusting a stored `collecting` phase
/// instead of expecting transactional guarantees here. When file-backed,
/// every mutation rewrites the whole snapshot through the atomic writer.
#[derive(Clone)]
pub struct SharedStore {
    data: Arc<Mutex<StoreData>>,
    writer: Option<Arc<SnapshotWriter>>,
}

impl SharedStore {
    pub fn in_memory(data: StoreData) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            writer: None,
        }
    }

    pub fn file_backed(data: StoreData, path: PathBuf) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            writer: Some(Arc::new(SnapshotWriter::new(path))),
        }
    }

    pub fn snapshot(&self) -> StoreData {
        self.lock().clone()
    }

    /// Reads the guarded phase pair as one value.
    pub fn collection_pair(&self) -> (CollectionStateTag, Option<TargetId>) {
        let data = self.lock();
        (data.collection_state, data.active_collection_tab_id)
    }

    /// Writes the guarded phase pair and the addresses on display, together.
    ///
    /// A `collecting` tag without an owning target is a bug at the caller;
    /// the pair is normalized to idle rather than stored inconsistent.
    pub fn set_collection(
        &self,
        state: CollectionStateTag,
        target: Option<TargetId>,
        collected: Vec<String>,
    ) {
        let mut data = self.lock();
        if state == CollectionStateTag::Collecting && target.is_none() {
            ctx_warn!("refusing to store a collecting phase without an owner");
            data.collection_state = CollectionStateTag::Idle;
            data.active_collection_tab_id = None;
        } else {
            data.collection_state = state;
            data.active_collection_tab_id = target;
        }
        data.collected_emails = collected;
        self.persist(&data);
    }

    /// Prepends a history entry, evicting beyond the cap.
    pub fn append_history(&self, entry: HistoryEntry) {
        let mut data = self.lock();
        data.history.insert(0, entry);
        data.history.truncate(HISTORY_CAP);
        self.persist(&data);
    }

    pub fn remove_history(&self, id: i64) {
        let mut data = self.lock();
        data.history.retain(|entry| entry.id != id);
        self.persist(&data);
    }

    pub fn clear_history(&self) {
        let mut data = self.lock();
        data.history.clear();
        self.persist(&data);
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().history.clone()
    }

    pub fn seen(&self) -> SeenCache {
        self.lock().cached_emails.clone()
    }

    pub fn replace_seen(&self, seen: SeenCache) {
        let mut data = self.lock();
        data.cached_emails = seen;
        self.persist(&data);
    }

    pub fn clear_seen(&self) {
        let mut data = self.lock();
        data.cached_emails.clear();
        self.persist(&data);
    }

    pub fn set_form(
        &self,
        keywords: String,
        scroll_count: u32,
        exclude_keywords: String,
        include_unique: bool,
    ) {
        let mut data = self.lock();
        data.keywords = keywords;
        data.scroll_count = scroll_count;
        data.exclude_keywords = exclude_keywords;
        data.include_unique = include_unique;
        self.persist(&data);
    }

    pub fn set_current_url(&self, url: String) {
        let mut data = self.lock();
        data.current_tab_url = url;
        self.persist(&data);
    }

    /// Generic proxy write: merges loose key/value pairs into the snapshot.
    ///
    /// Unknown keys are dropped by deserialization; a merge that breaks the
    /// schema leaves the store untouched.
    pub fn merge_value(&self, patch: Map<String, Value>) -> Result<(), PersistError> {
        let mut data = self.lock();
        let mut object = match serde_json::to_value(&*data) {
            Ok(Value::Object(object)) => object,
            Ok(_) => return Err(PersistError::Encode("store is not an object".into())),
            Err(err) => return Err(PersistError::Encode(err.to_string())),
        };
        object.extend(patch);
        let merged: StoreData = serde_json::from_value(Value::Object(object))
            .map_err(|err| PersistError::Encode(err.to_string()))?;
        *data = merged;
        self.persist(&data);
        Ok(())
    }

    /// Generic proxy read: the requested keys of the snapshot, or the whole
    /// snapshot when no keys are named.
    pub fn select_value(&self, keys: &[String]) -> Map<String, Value> {
        let data = self.lock();
        let object = match serde_json::to_value(&*data) {
            Ok(Value::Object(object)) => object,
            _ => Map::new(),
        };
        if keys.is_empty() {
            return object;
        }
        object
            .into_iter()
            .filter(|(key, _)| keys.contains(key))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreData> {
        self.data.lock().expect("lock store data")
    }

    fn persist(&self, data: &StoreData) {
        let Some(writer) = &self.writer else {
            return;
        };
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(data, pretty) {
            Ok(content) => content,
            Err(err) => {
                ctx_warn!("failed to serialize store snapshot: {}", err);
                return;
            }
        };
        if let Err(err) = writer.write(&content) {
            ctx_warn!("failed to write store snapshot to {:?}: {}", writer.path(), err);
        }
    }
}
