use std::fs;
use std::io;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::domain::Calculation;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "FreightCostEstimator";
const APP_NAME: &str = "FreightCostEstimator";

/// Session state that survives restarts: the operator's margin and the
/// committed calculations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub margin_percent: i32,
    pub calculations: Vec<Calculation>,
}

fn data_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("state.json"))
}

pub fn load_persisted_state() -> Option<PersistedState> {
    let path = data_file()?;
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn save_persisted_state(state: &PersistedState) -> Result<(), PersistSaveError> {
    let path = data_file().ok_or(PersistSaveError::StorageUnavailable)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PersistSaveError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_state_round_trips_through_json() {
        let state = PersistedState {
            margin_percent: -15,
            calculations: vec![Calculation {
                id: 3,
                collection_cost: 450.0,
                delivery_cost: 360.0,
                ferry_cost: 500.0,
                margin_amount: 131.0,
                total: 1441.0,
                timestamp: "2026-08-30T12:00:00Z".into(),
            }],
        };

        let json = serde_json::to_string_pretty(&state).unwrap();
        let restored: PersistedState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn margin_defaults_when_absent_from_older_saves() {
        let restored: PersistedState =
            serde_json::from_str(r#"{"calculations": []}"#).unwrap();
        assert_eq!(restored.margin_percent, 0);
        assert!(restored.calculations.is_empty());
    }
}
