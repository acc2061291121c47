use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Settings carried across sessions. Only the UI language today.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug)]
pub enum PreferencesError {
    Io(std::io::Error),
    Corrupt(String),
}

impl std::fmt::Display for PreferencesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferencesError::Io(err) => write!(f, "preferences storage error: {err}"),
            PreferencesError::Corrupt(msg) => write!(f, "preferences corrupt: {msg}"),
        }
    }
}

impl std::error::Error for PreferencesError {}

pub trait PreferencesStore {
    /// Stored preferences, or the defaults when nothing was saved yet.
    fn load(&self) -> Result<Preferences, PreferencesError>;
    fn save(&mut self, prefs: &Preferences) -> Result<(), PreferencesError>;
}

#[derive(Debug, Default)]
pub struct InMemoryPreferencesStore {
    prefs: Option<Preferences>,
}

impl InMemoryPreferencesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferencesStore for InMemoryPreferencesStore {
    fn load(&self) -> Result<Preferences, PreferencesError> {
        Ok(self.prefs.clone().unwrap_or_default())
    }

    fn save(&mut self, prefs: &Preferences) -> Result<(), PreferencesError> {
        self.prefs = Some(prefs.clone());
        Ok(())
    }
}

/// JSON file under a config directory.
#[derive(Debug, Clone)]
pub struct FilePreferencesStore {
    path: PathBuf,
}

impl FilePreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(PREFERENCES_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferencesStore for FilePreferencesStore {
    fn load(&self) -> Result<Preferences, PreferencesError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Preferences::default());
            }
            Err(err) => return Err(PreferencesError::Io(err)),
        };
        serde_json::from_str(&raw).map_err(|e| PreferencesError::Corrupt(e.to_string()))
    }

    fn save(&mut self, prefs: &Preferences) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(PreferencesError::Io)?;
        }
        let raw = serde_json::to_string_pretty(prefs)
            .map_err(|e| PreferencesError::Corrupt(e.to_string()))?;
        fs::write(&self.path, raw).map_err(PreferencesError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FilePreferencesStore, InMemoryPreferencesStore, Preferences, PreferencesError,
        PreferencesStore,
    };
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("waypoint_prefs_{label}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn german() -> Preferences {
        Preferences {
            language: Some("de".to_string()),
        }
    }

    #[test]
    fn in_memory_store_round_trips() {
        let mut store = InMemoryPreferencesStore::new();
        assert_eq!(store.load().expect("load"), Preferences::default());
        store.save(&german()).expect("save");
        assert_eq!(store.load().expect("load"), german());
    }

    #[test]
    fn file_store_persists_language() {
        let dir = temp_dir("persist");
        let mut store = FilePreferencesStore::in_dir(&dir);
        assert_eq!(store.load().expect("missing file"), Preferences::default());

        store.save(&german()).expect("save");
        let reopened = FilePreferencesStore::in_dir(&dir);
        assert_eq!(reopened.load().expect("load"), german());

        let raw = fs::read_to_string(reopened.path()).expect("read");
        assert!(raw.contains("\"language\": \"de\""));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = temp_dir("corrupt");
        let store = FilePreferencesStore::in_dir(&dir);
        fs::write(store.path(), "not json").expect("write");
        assert!(matches!(store.load(), Err(PreferencesError::Corrupt(_))));
    }
}
