// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake.

use ads_app_core::config::{ConfigError, ConfigStore};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// [`ConfigStore`] kept in memory; clones share state.
///
/// ```
/// use ads_dry_tests::InMemoryConfigStore;
/// use ads_app_core::config::ConfigService;
/// use ads_app_core::prefs::{AgentPrefs, AGENT_PREFS_KEY};
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
/// let (_prefs, err) = service.load_or_init::<AgentPrefs>(AGENT_PREFS_KEY).unwrap();
/// assert!(err.is_none());
/// assert!(store.contains_key(AGENT_PREFS_KEY));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<StoreState>>,
}

#[derive(Default)]
struct StoreState {
    data: HashMap<String, Vec<u8>>,
    saves: usize,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding `value` as JSON under `key`.
    pub fn with_json(key: &str, value: &Value) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_owned(), value.to_string().into_bytes());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every subsequent save fail.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// Attempted saves, failed ones included.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// Whether `key` holds a blob.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    /// Blob under `key` parsed as JSON.
    pub fn json(&self, key: &str) -> Option<Value> {
        let state = self.lock();
        serde_json::from_slice(state.data.get(key)?).ok()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        self.lock().data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut state = self.lock();
        state.saves += 1;
        if state.fail_on_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }
        state.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
