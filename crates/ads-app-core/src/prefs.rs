// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Supply agent preferences (adserver endpoint, publisher, refresh policy).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use ads_proto::UiPosition;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Config key under which [`AgentPrefs`] are stored.
pub const AGENT_PREFS_KEY: &str = "supply_agent";

/// How overlay placements refresh once shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiRefresh {
    /// Shown once per presence activation; never refreshed.
    #[default]
    Disabled,
    /// Each overlay is re-fetched on its own after its creative's refresh time.
    PerPlacement,
}

/// Whether overlays come back after the user leaves and re-enters the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiRearm {
    /// The first activation is the only one; presence polling then stops.
    #[default]
    Never,
    /// Leaving clears the overlays; the next entry fetches them again.
    OnReentry,
}

/// Payout chains a wallet-derived publisher id can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// ADS blockchain.
    Ads,
    /// BNB smart chain.
    Bsc,
}

impl Chain {
    /// Wire prefix of the chain.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ads => "ads",
            Self::Bsc => "bsc",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ads" => Ok(Self::Ads),
            "bsc" => Ok(Self::Bsc),
            other => Err(format!("unknown chain `{other}`")),
        }
    }
}

/// Publisher id for a payout wallet: `"<chain>:<lowercase address>"`.
pub fn publisher_from_wallet(chain: Chain, address: &str) -> String {
    format!("{chain}:{}", address.trim().to_lowercase())
}

/// Persisted supply agent settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrefs {
    /// Adserver base URL.
    pub adserver: String,
    /// Publisher id.
    pub publisher: String,
    /// Host engine name reported as `vendor`.
    pub vendor: String,
    /// Upper bound on registered spatial placements.
    pub max_placements: usize,
    /// Floor for every refresh delay, in milliseconds.
    pub min_refresh_ms: u64,
    /// Presence polling interval, in milliseconds.
    pub presence_poll_ms: u64,
    /// Overlay refresh policy.
    pub ui_refresh: UiRefresh,
    /// Overlay re-arm policy.
    pub ui_rearm: UiRearm,
    /// Delay before a failed scheduled refresh is retried; `None` stops refreshing.
    pub failure_backoff_ms: Option<u64>,
    /// Overlay positions to enable.
    pub ui_positions: Vec<UiPosition>,
}

impl Default for AgentPrefs {
    fn default() -> Self {
        Self {
            adserver: "https://app.web3ads.net".into(),
            publisher: String::new(),
            vendor: "decentraland".into(),
            max_placements: 20,
            min_refresh_ms: 5_000,
            presence_poll_ms: 500,
            ui_refresh: UiRefresh::default(),
            ui_rearm: UiRearm::default(),
            failure_backoff_ms: None,
            ui_positions: Vec::new(),
        }
    }
}

impl AgentPrefs {
    /// Prefs for `adserver` and `publisher` with every other field defaulted.
    pub fn new(adserver: impl Into<String>, publisher: impl Into<String>) -> Self {
        Self {
            adserver: adserver.into(),
            publisher: publisher.into(),
            ..Self::default()
        }
    }

    /// Floor for every refresh delay.
    pub fn min_refresh(&self) -> Duration {
        Duration::from_millis(self.min_refresh_ms)
    }

    /// Presence polling interval.
    pub fn presence_poll(&self) -> Duration {
        Duration::from_millis(self.presence_poll_ms)
    }

    /// Retry delay after a failed scheduled refresh.
    pub fn failure_backoff(&self) -> Option<Duration> {
        self.failure_backoff_ms.map(Duration::from_millis)
    }

    /// Reject settings the agent cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.adserver.trim_end_matches('/').is_empty() {
            return Err(ConfigError::Invalid("adserver must not be empty".into()));
        }
        if self.publisher.trim().is_empty() {
            return Err(ConfigError::Invalid("publisher must not be empty".into()));
        }
        if self.presence_poll_ms == 0 {
            return Err(ConfigError::Invalid("presence_poll_ms must be positive".into()));
        }
        Ok(())
    }
}
