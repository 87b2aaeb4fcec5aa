use std::fs;
use std::path::{Path, PathBuf};

use collector_engine::StoreData;
use collector_logging::{ctx_info, ctx_warn};

pub const STORE_FILENAME: &str = "collector_state.ron";

/// Default store location: the current working directory.
pub fn default_store_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(STORE_FILENAME)
}

/// Loads the persisted store snapshot, falling back to first-run defaults.
///
/// A missing file is the normal first run; an unreadable or unparsable one
/// is logged and treated the same way, since every value in the store can be
/// rebuilt by using the app.
pub fn load_store(path: &Path) -> StoreData {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            ctx_info!("no store snapshot at {:?}, starting with defaults", path);
            return StoreData::default();
        }
        Err(err) => {
            ctx_warn!("failed to read store snapshot from {:?}: {}", path, err);
            return StoreData::default();
        }
    };

    match ron::from_str(&content) {
        Ok(data) => {
            ctx_info!("loaded store snapshot from {:?}", path);
            data
        }
        Err(err) => {
            ctx_warn!("failed to parse store snapshot from {:?}: {}", path, err);
            StoreData::default()
        }
    }
}
