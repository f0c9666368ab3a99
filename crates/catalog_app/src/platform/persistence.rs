use std::fs;
use std::path::Path;

use catalog_logging::{catalog_info, catalog_warn};
use serde::{Deserialize, Serialize};

pub(crate) const STATE_FILENAME: &str = ".catalog_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
struct PersistedState {
    /// Canonical address of the last browse, e.g. `/games?ordering=-rating`.
    last_address: Option<String>,
}

/// The address saved by the previous run, if any.
pub(crate) fn load_last_address(dir: &Path) -> Option<String> {
    let path = dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            catalog_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<PersistedState>(&content) {
        Ok(state) => {
            catalog_info!("Loaded persisted address from {:?}", path);
            state.last_address
        }
        Err(err) => {
            catalog_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save_last_address(dir: &Path, address: &str) {
    let state = PersistedState {
        last_address: Some(address.to_string()),
    };
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            catalog_warn!("Failed to serialize persisted state: {}", err);
            return;
        }
    };

    let path = dir.join(STATE_FILENAME);
    if let Err(err) = fs::write(&path, content) {
        catalog_warn!("Failed to write persisted state to {:?}: {}", path, err);
    }
}
