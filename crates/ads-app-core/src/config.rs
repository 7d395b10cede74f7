// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyed JSON settings behind a storage port.
//!
//! [`ConfigStore`] moves raw bytes; [`ConfigService`] owns the JSON encoding
//! and the agent-specific loading rules (defaults on first run, validation).

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::prefs::{AgentPrefs, AGENT_PREFS_KEY};

/// Byte-level storage for settings blobs, addressed by key.
pub trait ConfigStore {
    /// Read the blob stored under `key`; [`ConfigError::NotFound`] when absent.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replace the blob stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures while reading, writing or checking settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("not found")]
    NotFound,
    /// Backing storage failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Stored bytes are not valid JSON for the requested type.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Settings decoded but cannot be used.
    #[error("invalid settings: {0}")]
    Invalid(String),
    /// Anything else reported by a store.
    #[error("other: {0}")]
    Other(String),
}

/// JSON settings service over a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wrap `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwrap the backing store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Decode the value under `key`. Missing and empty blobs both yield `Ok(None)`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Encode `value` as pretty JSON under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Load `key`, or write and return `T::default()` when nothing is stored.
    ///
    /// The second tuple element carries a failed write of the defaults; the
    /// defaults are returned regardless.
    pub fn load_or_init<T>(&self, key: &str) -> Result<(T, Option<ConfigError>), ConfigError>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        if let Some(value) = self.load(key)? {
            return Ok((value, None));
        }
        let value = T::default();
        let save_err = self.save(key, &value).err();
        Ok((value, save_err))
    }

    /// Stored agent prefs (or defaults), with `overrides` applied, then validated.
    ///
    /// Overrides are not written back.
    pub fn agent_prefs(
        &self,
        overrides: impl FnOnce(&mut AgentPrefs),
    ) -> Result<AgentPrefs, ConfigError> {
        let mut prefs: AgentPrefs = self.load(AGENT_PREFS_KEY)?.unwrap_or_default();
        overrides(&mut prefs);
        prefs.validate()?;
        Ok(prefs)
    }
}
