// Persisted selection store
//
// A single JSON object file holds everything that must survive navigation:
// the current app, the competitor app, the dark-mode flag, and the
// payment-success latch. Writes overwrite whole values; an unreadable or
// unparseable file reads as empty and is replaced on the next write.

use crate::api::models::AppEntry;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// File name under the store directory
const STORE_FILE: &str = "store.json";

// Well-known keys. Callers outside this module go through the typed
// accessors; the raw get/set surface exists for them and for tests.
const KEY_CURRENT_APP: &str = "current_app";
const KEY_COMPETITOR: &str = "competitor_app";
const KEY_DARK_MODE: &str = "dark_mode";
const KEY_PAYMENT: &str = "payment_successful";

/// Key-value store persisted as one JSON file
///
/// Reads and writes are synchronous on the calling thread; the interior
/// mutex only guards the in-memory copy against concurrent accessors.
pub struct SelectionStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl SelectionStore {
    /// Open (or create) the store under the given directory
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).context("Failed to create store directory")?;
        let path = dir.join(STORE_FILE);

        // A corrupt file is treated as absent, not an error: the next write
        // replaces it wholesale
        let values = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Unparseable store file {}: {}", path.display(), e);
                Map::new()
            }),
            Err(_) => Map::new(),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Get a value by key; absent or undecodable values are None
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let values = self.values.lock().unwrap();
        values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value, overwriting any previous value wholesale
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_value(value).context("Value is not JSON-encodable")?;
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), encoded);
        self.flush(&values)
    }

    /// Remove a key; removing an absent key is a no-op
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap();
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }

    /// Write the whole map back to disk
    fn flush(&self, values: &Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string_pretty(values).context("Failed to encode store")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    // ── Typed accessors ─────────────────────────────────────────────────────

    /// The user's current app; None means nothing real is selected yet and
    /// pages render sample data without fetching
    pub fn current_app(&self) -> Option<AppEntry> {
        self.get(KEY_CURRENT_APP)
    }

    /// Replace the current app. There is never more than one: the slot is a
    /// single value, not a list.
    pub fn set_current_app(&self, app: &AppEntry) -> Result<()> {
        self.set(KEY_CURRENT_APP, app)
    }

    pub fn clear_current_app(&self) -> Result<()> {
        self.remove(KEY_CURRENT_APP)
    }

    /// The competitor app slot, independent of the current app
    pub fn competitor(&self) -> Option<AppEntry> {
        self.get(KEY_COMPETITOR)
    }

    pub fn set_competitor(&self, app: &AppEntry) -> Result<()> {
        self.set(KEY_COMPETITOR, app)
    }

    pub fn clear_competitor(&self) -> Result<()> {
        self.remove(KEY_COMPETITOR)
    }

    /// Dark-mode preference, applied before the first frame
    pub fn dark_mode(&self) -> bool {
        self.get(KEY_DARK_MODE).unwrap_or(false)
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.set(KEY_DARK_MODE, &enabled)
    }

    /// The local payment latch; true once payment has been observed
    pub fn payment_successful(&self) -> bool {
        self.get(KEY_PAYMENT).unwrap_or(false)
    }

    pub fn set_payment_successful(&self) -> Result<()> {
        self.set(KEY_PAYMENT, &true)
    }

    /// Clear everything tied to the session (logout): selections and the
    /// payment latch. The dark-mode preference survives.
    pub fn clear_session_keys(&self) -> Result<()> {
        self.remove(KEY_CURRENT_APP)?;
        self.remove(KEY_COMPETITOR)?;
        self.remove(KEY_PAYMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn app(id: i64, name: &str) -> AppEntry {
        AppEntry {
            id,
            name: name.to_string(),
            publisher: "Acme".to_string(),
            icon: "📱".to_string(),
        }
    }

    fn open_store(dir: &TempDir) -> SelectionStore {
        SelectionStore::open(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.set("k", &serde_json::json!({"a": [1, 2, 3]})).unwrap();
        let got: serde_json::Value = store.get("k").unwrap();
        assert_eq!(got, serde_json::json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir);
            store.set_current_app(&app(7, "Notes")).unwrap();
            store.set_dark_mode(true).unwrap();
        }

        let store = open_store(&dir);
        assert_eq!(store.current_app().unwrap().id, 7);
        assert!(store.dark_mode());
    }

    #[test]
    fn unparseable_file_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STORE_FILE), "not json {").unwrap();

        let store = open_store(&dir);
        assert!(store.current_app().is_none());

        // The next write replaces the corrupt file
        store.set_current_app(&app(1, "A")).unwrap();
        let store = open_store(&dir);
        assert_eq!(store.current_app().unwrap().name, "A");
    }

    #[test]
    fn selecting_b_over_a_leaves_exactly_b() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.set_current_app(&app(1, "A")).unwrap();
        store.set_current_app(&app(2, "B")).unwrap();

        let current = store.current_app().unwrap();
        assert_eq!(current.id, 2);
        assert_eq!(current.name, "B");
    }

    #[test]
    fn competitor_and_current_app_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.set_current_app(&app(1, "Mine")).unwrap();
        store.set_competitor(&app(2, "Theirs")).unwrap();

        // Changing one slot never touches the other
        store.set_competitor(&app(3, "Other")).unwrap();
        assert_eq!(store.current_app().unwrap().name, "Mine");

        store.clear_current_app().unwrap();
        assert_eq!(store.competitor().unwrap().name, "Other");
    }

    #[test]
    fn remove_is_a_noop_for_absent_keys() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.remove("never_set").unwrap();
    }

    #[test]
    fn logout_clears_session_keys_but_not_dark_mode() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.set_current_app(&app(1, "A")).unwrap();
        store.set_competitor(&app(2, "B")).unwrap();
        store.set_payment_successful().unwrap();
        store.set_dark_mode(true).unwrap();

        store.clear_session_keys().unwrap();

        assert!(store.current_app().is_none());
        assert!(store.competitor().is_none());
        assert!(!store.payment_successful());
        assert!(store.dark_mode());
    }
}
